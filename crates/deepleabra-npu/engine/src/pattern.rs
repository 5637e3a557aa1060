// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Connectivity patterns between a sending and a receiving layer.
//!
//! A pattern expands into a dense `[recv, send]` boolean matrix once at build
//! time; the pathway then compresses it into sparse per-sender and
//! per-receiver index lists.

use deepleabra_npu_neural::LayerShape;
use ndarray::Array2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Pattern {
    /// Every sender connects to every receiver
    #[default]
    Full,
    /// Unit `i` connects to unit `i`, up to the smaller layer size
    OneToOne,
    /// Pool `i` connects fully to pool `i`. A 2D side counts each of its units
    /// as a one-unit pool; two 2D layers connect fully.
    PoolOneToOne,
}

impl Pattern {
    /// Dense connection matrix indexed `[recv, send]`.
    pub fn connect(&self, send: &LayerShape, recv: &LayerShape) -> Array2<bool> {
        let ns = send.len();
        let nr = recv.len();
        let mut cons = Array2::from_elem((nr, ns), false);
        match self {
            Pattern::Full => cons.fill(true),
            Pattern::OneToOne => {
                for i in 0..ns.min(nr) {
                    cons[[i, i]] = true;
                }
            }
            Pattern::PoolOneToOne => match (send.is_4d(), recv.is_4d()) {
                (false, false) => cons.fill(true),
                (true, true) => {
                    let np = send.n_pools().min(recv.n_pools());
                    let snu = send.units_per_pool();
                    let rnu = recv.units_per_pool();
                    for pi in 0..np {
                        for ru in 0..rnu {
                            let ri = recv.pool_unit_index(pi, ru);
                            for su in 0..snu {
                                cons[[ri, send.pool_unit_index(pi, su)]] = true;
                            }
                        }
                    }
                }
                (true, false) => {
                    let np = send.n_pools().min(nr);
                    let snu = send.units_per_pool();
                    for pi in 0..np {
                        for su in 0..snu {
                            cons[[pi, send.pool_unit_index(pi, su)]] = true;
                        }
                    }
                }
                (false, true) => {
                    let np = recv.n_pools().min(ns);
                    let rnu = recv.units_per_pool();
                    for pi in 0..np {
                        for ru in 0..rnu {
                            cons[[recv.pool_unit_index(pi, ru), pi]] = true;
                        }
                    }
                }
            },
        }
        cons
    }
}
