//! End-to-end decision scenarios, run with fixed seeds.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ibl_agent::{
    set_similarity, Agent, AgentConfig, AgentError, Decision, ReferenceSnapshot, Value,
};

fn agent(config: AgentConfig) -> Agent {
    Agent::new(config).unwrap()
}

fn default_agent(default_utility: f64, seed: u64) -> Agent {
    agent(AgentConfig {
        default_utility: Some(default_utility),
        seed: Some(seed),
        ..AgentConfig::default()
    })
}

#[test]
fn two_option_task_settles_on_the_better_outcome() {
    let mut a = default_agent(10.0, 42);
    let options = [Decision::from("A"), Decision::from("B")];
    let mut late_a = 0;
    let rounds = 1000;
    for round in 0..rounds {
        let c = a.choose(&options).unwrap();
        let chose_a = c == options[0];
        if chose_a && round >= rounds / 2 {
            late_a += 1;
        }
        a.respond(if chose_a { 1.0 } else { -2.0 }).unwrap();
    }
    let rate = late_a as f64 / (rounds / 2) as f64;
    assert!(
        rate >= 0.90,
        "steady-state preference for the +1 option should dominate, got {rate}"
    );
}

#[test]
fn five_options_settle_on_the_zero_reward_pair() {
    let mut a = default_agent(10.0, 5);
    let rewards = [
        ("green", -5.0),
        ("blue", 0.0),
        ("yellow", -4.0),
        ("red", -6.0),
        ("violet", 0.0),
    ];
    let options: Vec<Decision> = rewards.iter().map(|(name, _)| (*name).into()).collect();
    let mut counts = [0usize; 5];
    let trials = 1000;
    for _ in 0..trials {
        let c = a.choose(&options).unwrap();
        let at = options.iter().position(|o| *o == c).unwrap();
        counts[at] += 1;
        a.respond(rewards[at].1).unwrap();
    }
    let blue = counts[1] as f64 / trials as f64;
    let violet = counts[4] as f64 / trials as f64;
    let red = counts[3] as f64 / trials as f64;
    assert!(
        blue + violet >= 0.75,
        "the zero-reward pair should dominate: blue {blue}, violet {violet}"
    );
    assert!(blue >= 0.25 && violet >= 0.25, "blue {blue}, violet {violet}");
    assert!(red <= 0.05, "the worst option should almost vanish, got {red}");
}

fn reward(x: f64) -> f64 {
    5.0 * (1.0 - (x - 0.72) * (x - 0.72))
}

/// Run the continuous-stimulus task; returns (correct-peak rate, mean
/// reward) over every trial after the first 100. A pick counts as
/// correct-peak when its reward comes within 0.1 (2% of the reward scale) of
/// the best option on offer, so two options straddling the peak with
/// near-identical rewards are not scored as misses.
fn run_stimulus_task(mu: f64, agent_seed: u64, task_seed: u64) -> (f64, f64) {
    let mut a = agent(AgentConfig {
        attributes: vec!["stimulus".to_string()],
        mismatch_penalty: Some(mu),
        default_utility: Some(10.0),
        seed: Some(agent_seed),
        ..AgentConfig::default()
    });
    let mut task = StdRng::seed_from_u64(task_seed);
    let trials = 400;
    let warmup = 100;
    let mut hits = 0;
    let mut total = 0.0;
    for trial in 0..trials {
        let xs: Vec<f64> = (0..5).map(|_| task.gen::<f64>()).collect();
        let options: Vec<Decision> = xs.iter().map(|&x| Decision::from(x)).collect();
        let c = a.choose(&options).unwrap();
        let at = options.iter().position(|o| *o == c).unwrap();
        let best = xs.iter().map(|&x| reward(x)).fold(f64::NEG_INFINITY, f64::max);
        if trial >= warmup {
            if reward(xs[at]) >= best - 0.1 {
                hits += 1;
            }
            total += reward(xs[at]);
        }
        a.respond(reward(xs[at])).unwrap();
    }
    let measured = (trials - warmup) as f64;
    (hits as f64 / measured, total / measured)
}

#[test]
fn partial_matching_generalizes_toward_the_reward_peak() {
    set_similarity(&["stimulus"], |a: &Value, b: &Value| {
        match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => 1.0 - (x - y).abs(),
            _ => 0.0,
        }
    });
    let (rate_sharp, mean_sharp) = run_stimulus_task(30.0, 101, 7);
    let (rate_flat, mean_flat) = run_stimulus_task(0.0, 102, 7);
    assert!(
        rate_sharp > 0.85,
        "μ=30 should pick the peak after 100 trials, got rate {rate_sharp}"
    );
    assert!(
        mean_sharp >= 4.55,
        "μ=30 should earn near-peak rewards, got mean {mean_sharp}"
    );
    assert!(
        rate_flat < 0.5,
        "μ=0 scores every option from the same instances, got rate {rate_flat}"
    );
    assert!(
        mean_sharp > mean_flat,
        "sharp {mean_sharp} vs flat {mean_flat}"
    );
}

#[test]
fn delayed_feedback_replaces_the_provisional_instance() {
    let mut a = agent(AgentConfig {
        default_utility: Some(10.0),
        default_utility_populates: false,
        seed: Some(33),
        ..AgentConfig::default()
    });
    let (chosen, mut handle) = a
        .choose_deferred(&["safe".into(), "risky".into()])
        .unwrap();
    assert!(!handle.is_resolved());
    assert_eq!(handle.expectation(), 10.0);
    assert_eq!(handle.outcome(), None);

    // a hundred unrelated rounds while the feedback stays outstanding
    for _ in 0..100 {
        a.choose(&["slow".into(), "fast".into()]).unwrap();
        a.respond(0.0).unwrap();
    }

    handle.update(&mut a, 2.0).unwrap();
    assert!(handle.is_resolved());
    assert_eq!(handle.outcome(), Some(2.0));

    let Decision::Value(chosen_value) = &chosen else {
        unreachable!()
    };
    let snaps = a.instances();
    let of_chosen: Vec<_> = snaps
        .iter()
        .filter(|s| &s.slots[0].1 == chosen_value)
        .collect();
    assert_eq!(of_chosen.len(), 1, "exactly one chunk for the chosen option");
    assert_eq!(of_chosen[0].utility, 2.0);
    assert_eq!(of_chosen[0].references, ReferenceSnapshot::Times(vec![2]));
    assert!(
        snaps.iter().all(|s| s.utility != 10.0),
        "no residual chunk at the provisional utility"
    );

    // resolving again with the same outcome is a no-op …
    handle.update(&mut a, 2.0).unwrap();
    // … but a conflicting outcome is a programming error
    assert!(matches!(
        handle.update(&mut a, 3.0),
        Err(AgentError::Protocol(_))
    ));
}

#[test]
fn delayed_resolution_matches_synchronous_respond() {
    let essence = |a: &Agent| {
        let mut rows: Vec<String> = a
            .instances()
            .iter()
            .map(|s| format!("{:?} u={} refs={:?}", s.slots, s.utility, s.references))
            .collect();
        rows.sort();
        rows
    };

    let cfg = AgentConfig {
        default_utility: Some(10.0),
        default_utility_populates: false,
        seed: Some(44),
        ..AgentConfig::default()
    };
    let mut sync = Agent::new(cfg.clone()).unwrap();
    let picked = sync.choose(&["l".into(), "r".into()]).unwrap();
    sync.respond(3.5).unwrap();

    let mut deferred = Agent::new(cfg).unwrap();
    let (picked2, mut handle) = deferred.choose_deferred(&["l".into(), "r".into()]).unwrap();
    handle.update(&mut deferred, 3.5).unwrap();

    assert_eq!(picked, picked2);
    assert_eq!(essence(&sync), essence(&deferred));
}

#[test]
fn provisional_outcome_can_be_overridden_once() {
    let mut a = agent(AgentConfig {
        default_utility: Some(10.0),
        default_utility_populates: false,
        seed: Some(8),
        ..AgentConfig::default()
    });
    a.choose(&["x".into()]).unwrap();
    let mut handle = a.respond_provisional(4.0).unwrap();
    assert!(!handle.is_resolved());
    assert_eq!(handle.outcome(), Some(4.0));
    let snaps = a.instances();
    assert_eq!(snaps.len(), 1);
    assert_eq!(snaps[0].utility, 4.0);

    handle.update(&mut a, 6.0).unwrap();
    let snaps = a.instances();
    assert_eq!(snaps.len(), 1);
    assert_eq!(snaps[0].utility, 6.0);
    assert_eq!(snaps[0].references, ReferenceSnapshot::Times(vec![2]));
}

#[test]
fn stale_handles_fail_after_reset() {
    let mut a = default_agent(1.0, 21);
    let (_, mut handle) = a.choose_deferred(&["x".into(), "y".into()]).unwrap();
    a.reset(false);
    assert!(matches!(
        handle.update(&mut a, 0.5),
        Err(AgentError::Protocol(_))
    ));
}

#[test]
fn reset_preserves_only_prepopulated_instances() {
    let mut a = agent(AgentConfig {
        seed: Some(3),
        ..AgentConfig::default()
    });
    a.populate(5.0, &["a".into()]).unwrap();
    a.choose(&["a".into()]).unwrap();
    a.respond(7.0).unwrap();
    a.choose(&["a".into()]).unwrap();
    a.respond(5.0).unwrap(); // merges into the prepopulated chunk

    a.reset(true);
    assert_eq!(a.time(), 0);
    let snaps = a.instances();
    assert_eq!(snaps.len(), 1);
    assert_eq!(snaps[0].utility, 5.0);
    assert_eq!(snaps[0].created_at, 0);
    assert_eq!(snaps[0].references, ReferenceSnapshot::Times(vec![0]));

    // and the preserved instance is usable again
    a.choose(&["a".into()]).unwrap();
    a.respond(1.0).unwrap();

    a.reset(false);
    assert!(a.instances().is_empty());
    assert_eq!(a.time(), 0);
}

#[test]
fn multi_attribute_agents_learn_contextual_rewards() {
    let mut a = agent(AgentConfig {
        attributes: vec!["route".to_string(), "hour".to_string()],
        default_utility: Some(5.0),
        seed: Some(60),
        ..AgentConfig::default()
    });
    let highway_morning = Decision::attributes([("route", "highway"), ("hour", "morning")]);
    let backroad_morning = Decision::attributes([("route", "backroad"), ("hour", "morning")]);
    let options = [highway_morning.clone(), backroad_morning.clone()];
    let mut highway = 0;
    let rounds = 200;
    for round in 0..rounds {
        let c = a.choose(&options).unwrap();
        let took_highway = c == highway_morning;
        if took_highway && round >= rounds / 2 {
            highway += 1;
        }
        a.respond(if took_highway { 2.0 } else { -1.0 }).unwrap();
    }
    let rate = highway as f64 / (rounds / 2) as f64;
    assert!(rate >= 0.8, "the rewarding route should win, got {rate}");
}
