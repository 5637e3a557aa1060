// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Single-neuron activation update against reference values.

use deepleabra::neural::{ActParams, Neuron};

const DIF_TOL: f32 = 1.0e-8;

fn cmpr(got: f32, trg: f32, what: &str, idx: usize) {
    let dif = (got - trg).abs();
    assert!(
        dif <= DIF_TOL,
        "{} err: idx: {}, got: {}, trg: {}, dif: {}",
        what,
        idx,
        got,
        trg,
        dif
    );
}

#[test]
fn test_act_update_sequence() {
    let ge_inc = [0.01f32, 0.02, 0.03, 0.04, 0.05, 0.1, 0.2, 0.3];
    let cor_ge = [
        0.007142857, 0.023469387, 0.049562685, 0.085589334, 0.13159695, 0.21617055, 0.3831916,
        0.64519763,
    ];
    let cor_inet = [
        -0.015714284,
        -0.0048542274,
        0.011293108,
        0.032156322,
        0.056659013,
        0.09967137,
        0.1782439,
        0.275567,
    ];
    let cor_vm = [
        0.3952381, 0.39376712, 0.39718926, 0.4069336, 0.424103, 0.45430642, 0.50831974, 0.5918249,
    ];
    let cor_act = [
        2.8884673e-29,
        3.2081596e-29,
        1.1549086e-28,
        3.2309342e-26,
        9.598328e-22,
        7.120265e-14,
        0.29335475,
        0.5022214,
    ];

    let mut ac = ActParams::default();
    ac.gbar.l = 0.2;
    ac.update();

    let mut nrn = Neuron::default();
    ac.init_acts(&mut nrn);

    for (i, &inc) in ge_inc.iter().enumerate() {
        nrn.ge_inc = inc;
        ac.g_raw_from_inc(&mut nrn);
        let (ge_raw, gi_raw) = (nrn.ge_raw, nrn.gi_raw);
        ac.ge_from_raw(&mut nrn, ge_raw);
        ac.gi_from_raw(&mut nrn, gi_raw);
        ac.vm_from_g(&mut nrn);
        ac.act_from_g(&mut nrn);

        cmpr(nrn.ge, cor_ge[i], "ge", i);
        cmpr(nrn.inet, cor_inet[i], "inet", i);
        cmpr(nrn.vm, cor_vm[i], "vm", i);
        cmpr(nrn.act, cor_act[i], "act", i);
    }
}
