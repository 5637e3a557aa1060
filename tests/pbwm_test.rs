// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Basal-ganglia gating circuit: gate-state propagation from GPiThal and
//! neuromodulator broadcast into the Matrix layers.

use deepleabra::plasticity::DaReceptors;
use deepleabra::prelude::*;

fn make_pbwm_net() -> Network {
    let mut net = Network::new("PBWM");
    let stim = net.add_layer_2d("Stim", 1, 4, LayerKind::Input);
    net.add_layer_2d("Rew", 1, 1, LayerKind::Input);
    let da = net.add_clamp_da_layer("DA");
    let cin = net.add_cin_layer("CIN", &["Rew"]);
    let pb = net.add_pbwm("", 1, 1, 1, 2, 2, 2, 2);

    for src in [da, cin] {
        net.layers[src.0].send_to = vec!["MatrixGo".to_string(), "MatrixNoGo".to_string()];
    }
    net.connect_layers(stim, pb.bg.go, Pattern::Full, PathKind::MatrixTrace);
    net.connect_layers(stim, pb.bg.nogo, Pattern::Full, PathKind::MatrixTrace);
    if let Some(mnt) = pb.pfc.mnt {
        net.connect_layers(stim, mnt, Pattern::Full, PathKind::Forward);
    }

    net.build().unwrap();
    net.init_weights();
    net.init_ext();
    net
}

fn gate_states(net: &Network, name: &str) -> Vec<(f32, bool)> {
    net.layer_by_name(name).unwrap().pools[1..]
        .iter()
        .map(|pl| (pl.gate.act, pl.gate.now))
        .collect()
}

#[test]
fn test_gating_targets_resolved() {
    let net = make_pbwm_net();
    let gpi = net.layer_by_name("GPiThal").unwrap();
    assert_eq!(gpi.send_to, vec!["MatrixGo", "MatrixNoGo", "PFCmntD", "PFCoutD"]);
    assert_eq!(gpi.pools.len(), 3);

    let nogo = net.layer_by_name("MatrixNoGo").unwrap();
    assert_eq!(nogo.pbwm.gate.da_r, DaReceptors::D2R);
}

#[test]
fn test_gate_pulse_follows_gpi_without_input() {
    let mut net = make_pbwm_net();
    let mut ctx = Context::default();

    net.alpha_cyc_init(true);
    ctx.alpha_cyc_start();
    let mut n_pulses = 0;
    for _ in 0..4 {
        for _ in 0..ctx.cyc_per_qtr {
            net.cycle(&ctx);

            let expect_now = (ctx.quarter == 0 || ctx.quarter == 2) && ctx.quarter_cycle() == 18;
            let gpi = gate_states(&net, "GPiThal");
            assert!(gpi.iter().all(|(_, now)| *now == expect_now), "cycle {}", ctx.cycle);
            assert_eq!(gate_states(&net, "MatrixGo"), gpi);
            assert_eq!(gate_states(&net, "MatrixNoGo"), gpi);
            if expect_now {
                n_pulses += 1;
            }

            ctx.cycle_inc();
        }
        net.quarter_final(&ctx);
        ctx.quarter_inc();
    }
    assert_eq!(n_pulses, 2);

    // nothing drives Go, so no stripe ever gates
    let gpi = net.layer_by_name("GPiThal").unwrap();
    assert!(gpi.pools[1..].iter().all(|pl| pl.gate.act == 0.0));
    assert!(gpi.neurons.iter().all(|n| n.act < 0.2));
}

#[test]
fn test_neuromodulators_reach_matrix() {
    let mut net = make_pbwm_net();
    let mut ctx = Context::default();
    net.apply_ext("DA", &[0.5]).unwrap();
    net.apply_ext("Rew", &[1.0]).unwrap();
    run_trial(&mut net, &mut ctx);

    let go = net.layer_by_name("MatrixGo").unwrap();
    let nogo = net.layer_by_name("MatrixNoGo").unwrap();
    assert!((go.neuro_mod.da - 0.5).abs() < 1e-6);
    assert_eq!(go.neuro_mod.ach, 1.0);
    assert_eq!(nogo.neuro_mod.ach, 1.0);

    for v in go.unit_values("DALrn").unwrap() {
        assert!((v - 0.5).abs() < 1e-6, "Go DALrn {}", v);
    }
    for v in nogo.unit_values("DALrn").unwrap() {
        assert!((v + 0.5).abs() < 1e-6, "NoGo DALrn {}", v);
    }
    assert_eq!(go.unit_value("DA", 0), go.neuro_mod.da);

    // layers off the send-to list are untouched
    let pfc = net.layer_by_name("PFCmnt").unwrap();
    assert_eq!(pfc.neuro_mod.da, 0.0);
}

#[test]
fn test_trace_learning_needs_dopamine() {
    let mut net = make_pbwm_net();
    let mut ctx = Context::default();
    net.apply_ext("Stim", &[1.0, 0.0, 1.0, 0.0]).unwrap();
    net.apply_ext("DA", &[0.0]).unwrap();
    run_trial(&mut net, &mut ctx);
    net.dwt();

    let go_path = net.recv_path_by_send_name("MatrixGo", "Stim").unwrap();
    let dwts = go_path.syn_values("DWt").unwrap();
    assert!(dwts.iter().all(|d| *d == 0.0), "no dopamine, no weight change");
    let trs = go_path.syn_values("Tr").unwrap();
    assert!(trs.iter().any(|t| *t != 0.0), "trace still formed");
}

const MATRIX_LAYERS: [&str; 2] = ["MatrixGo", "MatrixNoGo"];

/// Weight changes after a trial with `da` clamped, starting from traces that
/// alternate in sign across synapses. Returns `(traces, dwts)` for Go and NoGo.
fn dwts_after_da(da: f32) -> [(Vec<f32>, Vec<f32>); 2] {
    let mut net = make_pbwm_net();
    let mut ctx = Context::default();
    for recv in MATRIX_LAYERS {
        let n_recv = net.layer_by_name(recv).unwrap().len();
        let pt = net.recv_path_by_send_name_mut(recv, "Stim").unwrap();
        for si in 0..4 {
            for ri in 0..n_recv {
                let tr = if (si + ri) % 2 == 0 { 0.2 } else { -0.2 };
                pt.set_syn_value("Tr", si, ri, tr).unwrap();
            }
        }
    }
    let trs = MATRIX_LAYERS.map(|recv| {
        net.recv_path_by_send_name(recv, "Stim").unwrap().syn_values("Tr").unwrap()
    });

    net.apply_ext("Stim", &[1.0, 0.0, 1.0, 0.0]).unwrap();
    net.apply_ext("DA", &[da]).unwrap();
    run_trial(&mut net, &mut ctx);
    net.dwt();

    let [go_tr, nogo_tr] = trs;
    let [go_dwt, nogo_dwt] = MATRIX_LAYERS.map(|recv| {
        net.recv_path_by_send_name(recv, "Stim").unwrap().syn_values("DWt").unwrap()
    });
    [(go_tr, go_dwt), (nogo_tr, nogo_dwt)]
}

#[test]
fn test_da_sign_sets_dwt_direction_by_receptor() {
    for da in [0.5f32, -0.5] {
        let [(go_tr, go_dwt), (nogo_tr, nogo_dwt)] = dwts_after_da(da);
        // D1R: dwt follows da * tr; D2R: reversed
        for (tr, dwt) in go_tr.iter().zip(&go_dwt) {
            assert_eq!(dwt.signum(), (da * tr).signum(), "Go da {} tr {} dwt {}", da, tr, dwt);
        }
        for (tr, dwt) in nogo_tr.iter().zip(&nogo_dwt) {
            assert_eq!(dwt.signum(), (-da * tr).signum(), "NoGo da {} tr {} dwt {}", da, tr, dwt);
        }
    }
}

#[test]
fn test_nogo_bursts_damped_on_negative_trace() {
    let [(go_tr, go_dwt), (nogo_tr, nogo_dwt)] = dwts_after_da(0.5);
    let go_rate = (go_dwt[0] / go_tr[0]).abs();
    assert!(go_rate > 0.0);
    for (tr, dwt) in nogo_tr.iter().zip(&nogo_dwt) {
        let rate = (dwt / tr).abs();
        let expect = if *tr < 0.0 { 0.1 * go_rate } else { go_rate };
        assert!((rate - expect).abs() <= 1e-4 * go_rate, "tr {} rate {} expect {}", tr, rate, expect);
    }
}
