use pokemon_battle_rooms::error::{BattleError, ProtocolError, ValidationError};
use pokemon_battle_rooms::model::{
    BaseStats, CreatureData, EffectData, EffectTarget, MoveCategory, MoveData, Sprites, StatusCondition,
};
use pokemon_battle_rooms::registry::SessionId;
use pokemon_battle_rooms::roster::{Combatant, Creature, Side};
use pokemon_battle_rooms::rules::Rules;
use pokemon_battle_rooms::session::{Action, BattleSession, Ending, Phase};
use pokemon_battle_rooms::types::ElementType;

fn make_move(name: &str, power: u32, pp: u8) -> MoveData {
    MoveData {
        name: name.to_string(),
        move_type: ElementType::Normal,
        category: MoveCategory::Physical,
        power,
        accuracy: 100,
        pp,
        effect: None,
    }
}

fn tap() -> MoveData {
    make_move("Tap", 40, 10)
}

fn make_mon(name: &str, hp: u32, spe: u32, moves: Vec<MoveData>) -> Creature {
    let data = CreatureData {
        name: name.to_string(),
        types: vec![ElementType::Water],
        stats: BaseStats {
            hp,
            atk: 100,
            def: 100,
            spa: 100,
            spd: 100,
            spe,
        },
        sprites: Sprites {
            front: format!("front/{name}.png"),
            back: format!("back/{name}.png"),
        },
        learnset: Vec::new(),
    };
    Creature::new(&data, moves).expect("valid creature")
}

fn pair(player: &str, spe: u32) -> Combatant {
    Combatant::new(
        player,
        vec![
            make_mon(&format!("{player}-lead"), 200, spe, vec![tap()]),
            make_mon(&format!("{player}-back"), 200, spe, vec![tap()]),
        ],
    )
    .expect("valid roster")
}

fn session_with(a: Combatant, b: Combatant) -> BattleSession {
    let mut session = BattleSession::with_seed(SessionId(1), Rules::deterministic_damage(), 11);
    assert_eq!(session.attach("alice", a), Ok(Side::A));
    assert_eq!(session.attach("bob", b), Ok(Side::B));
    session
}

fn resolve(session: &mut BattleSession, a: Action, b: Action) -> Vec<String> {
    session.submit_move("alice", a).expect("alice move accepted");
    session.submit_move("bob", b).expect("bob move accepted");
    assert!(session.ready_to_resolve());
    let dispatches = session.resolve_turn().expect("turn resolves");
    assert_eq!(dispatches.len(), 2);
    assert_eq!(dispatches[0].report.lines, dispatches[1].report.lines);
    dispatches[0].report.lines.clone()
}

#[test]
fn double_switch_only_reports_switches() {
    let mut session = session_with(pair("alice", 50), pair("bob", 50));
    let lines = resolve(&mut session, Action::Switch(1), Action::Switch(1));
    assert_eq!(
        lines,
        vec![
            "alice switched to alice-back!".to_string(),
            "bob switched to bob-back!".to_string(),
        ]
    );
    for side in Side::BOTH {
        let combatant = session.combatant(side).expect("seated");
        assert_eq!(combatant.active_index(), 1);
        assert_eq!(combatant.remaining(), 2);
    }
    assert_eq!(session.phase(), Phase::InProgress);
}

#[test]
fn switching_goes_before_a_faster_attack() {
    let mut session = session_with(pair("alice", 200), pair("bob", 10));
    let lines = resolve(&mut session, Action::Attack(0), Action::Switch(1));
    assert_eq!(lines[0], "bob switched to bob-back!");
    assert_eq!(lines[1], "alice-lead used Tap!");
    // (100 * 40) / (100 * 50) + 2 = 2.8, plus the flat 20
    assert_eq!(lines[2], "bob-back has 177/200 HP left.");
    let bob = session.combatant(Side::B).expect("seated");
    assert_eq!(bob.roster[0].current_hp, 200);
}

#[test]
fn slower_side_switching_still_goes_first() {
    let mut session = session_with(pair("alice", 10), pair("bob", 200));
    let lines = resolve(&mut session, Action::Switch(1), Action::Attack(0));
    assert_eq!(
        lines,
        vec![
            "alice switched to alice-back!".to_string(),
            "bob-lead used Tap!".to_string(),
            "alice-back has 177/200 HP left.".to_string(),
        ]
    );
    let alice = session.combatant(Side::A).expect("seated");
    assert_eq!(alice.active_index(), 1);
    assert_eq!(alice.roster[0].current_hp, 200);
}

#[test]
fn knockout_skips_the_slower_attack() {
    let alice = pair("alice", 120);
    let bob = Combatant::new(
        "bob",
        vec![
            make_mon("bob-lead", 10, 60, vec![tap()]),
            make_mon("bob-back", 200, 60, vec![tap()]),
        ],
    )
    .expect("valid roster");
    let mut session = session_with(alice, bob);
    let lines = resolve(&mut session, Action::Attack(0), Action::Attack(0));

    assert!(lines.iter().all(|line| !line.starts_with("bob-lead used")));
    assert!(lines.contains(&"bob-lead fainted!".to_string()));
    assert_eq!(session.combatant(Side::B).expect("seated").remaining(), 1);
    assert_eq!(session.combatant(Side::A).expect("seated").active().current_hp, 200);
    assert_eq!(session.phase(), Phase::AwaitingReplacement);
    assert!(session.needs_replacement("bob"));
    assert!(!session.needs_replacement("alice"));
}

#[test]
fn certain_secondary_effect_lands_on_the_defender() {
    let mut scald = make_move("Scald", 40, 10);
    scald.effect = Some(EffectData {
        status: StatusCondition::Burn,
        chance: 100,
        target: EffectTarget::Opponent,
    });
    let alice = Combatant::new("alice", vec![make_mon("alice-lead", 200, 120, vec![scald])]).expect("roster");
    let mut session = session_with(alice, pair("bob", 10));
    let lines = resolve(&mut session, Action::Attack(0), Action::Attack(0));

    let bob_lead = session.combatant(Side::B).expect("seated").active();
    assert_eq!(bob_lead.condition(), Some(StatusCondition::Burn));
    assert!(lines.contains(&"bob-lead is burned!".to_string()));
    assert!(lines.contains(&"bob-lead is hurt by its burn!".to_string()));
    // 23 from the hit, 12 from the burn tick
    assert_eq!(bob_lead.current_hp, 200 - 23 - 12);
}

#[test]
fn buffer_is_empty_after_resolution() {
    let mut session = session_with(pair("alice", 50), pair("bob", 40));
    resolve(&mut session, Action::Attack(0), Action::Attack(0));
    assert_eq!(session.pending_count(), 0);
    assert!(!session.ready_to_resolve());
    assert_eq!(session.turn(), 1);
}

#[test]
fn resolving_with_one_pending_move_is_rejected() {
    let mut session = session_with(pair("alice", 50), pair("bob", 40));
    session.submit_move("bob", Action::Attack(0)).expect("accepted");
    assert_eq!(
        session.resolve_turn(),
        Err(BattleError::Protocol(ProtocolError::NotReady(1)))
    );
    assert_eq!(session.turn(), 0);
}

#[test]
fn third_combatant_is_a_protocol_error() {
    let mut session = session_with(pair("alice", 50), pair("bob", 40));
    let err = session.attach("carol", pair("carol", 40)).expect_err("no third seat");
    assert_eq!(err, BattleError::Protocol(ProtocolError::ThirdCombatant));
    assert!(!err.is_recoverable());
}

#[test]
fn drained_move_is_rejected_and_session_untouched() {
    let lead = make_mon("alice-lead", 200, 90, vec![make_move("Once", 40, 1), tap()]);
    let alice = Combatant::new("alice", vec![lead]).expect("roster");
    let mut session = session_with(alice, pair("bob", 10));
    resolve(&mut session, Action::Attack(0), Action::Attack(0));
    assert_eq!(session.combatant(Side::A).expect("seated").active().moves[0].current_pp, 0);

    let err = session.submit_move("alice", Action::Attack(0)).expect_err("no PP");
    assert_eq!(
        err,
        BattleError::Validation(ValidationError::NoPpLeft {
            move_name: "Once".to_string()
        })
    );
    assert!(err.is_recoverable());
    assert_eq!(session.pending_count(), 0);
    session.submit_move("alice", Action::Attack(1)).expect("other move still usable");
}

#[test]
fn illegal_switches_are_validation_errors() {
    let mut session = session_with(pair("alice", 50), pair("bob", 40));
    assert!(matches!(
        session.submit_move("alice", Action::Switch(0)),
        Err(BattleError::Validation(ValidationError::SameCreatureSwitch { .. }))
    ));
    assert_eq!(
        session.submit_move("alice", Action::Switch(6)),
        Err(BattleError::Validation(ValidationError::IndexOutOfBounds { index: 6, len: 2 }))
    );
    assert_eq!(
        session.submit_move("alice", Action::Attack(3)),
        Err(BattleError::Validation(ValidationError::IndexOutOfBounds { index: 3, len: 1 }))
    );
}

#[test]
fn poison_hurts_twice_in_one_turn() {
    let mut lead = make_mon("alice-lead", 160, 90, vec![make_move("Growl", 0, 10)]);
    lead.set_status(StatusCondition::Poison);
    let alice = Combatant::new("alice", vec![lead]).expect("roster");
    let bob = Combatant::new("bob", vec![make_mon("bob-lead", 200, 10, vec![make_move("Growl", 0, 10)])])
        .expect("roster");
    let mut session = session_with(alice, bob);
    let lines = resolve(&mut session, Action::Attack(0), Action::Attack(0));
    let poison_lines = lines.iter().filter(|line| *line == "alice-lead is hurt by poison!").count();
    assert_eq!(poison_lines, 2);
    assert_eq!(session.combatant(Side::A).expect("seated").active().current_hp, 120);
}

#[test]
fn end_of_turn_effects_follow_move_order() {
    let growl = || make_move("Growl", 0, 10);
    let mut alice_lead = make_mon("alice-lead", 160, 120, vec![growl()]);
    alice_lead.set_status(StatusCondition::Burn);
    let mut bob_lead = make_mon("bob-lead", 160, 10, vec![growl()]);
    bob_lead.set_status(StatusCondition::Poison);
    let alice = Combatant::new("alice", vec![alice_lead]).expect("roster");
    let bob = Combatant::new("bob", vec![bob_lead]).expect("roster");
    let mut session = session_with(alice, bob);
    let lines = resolve(&mut session, Action::Attack(0), Action::Attack(0));
    assert_eq!(
        lines,
        vec![
            "alice-lead is burned!".to_string(),
            "alice-lead used Growl!".to_string(),
            "bob-lead is hurt by poison!".to_string(),
            "bob-lead used Growl!".to_string(),
            "alice-lead is hurt by its burn!".to_string(),
            "bob-lead is hurt by poison!".to_string(),
        ]
    );
    assert_eq!(session.combatant(Side::A).expect("seated").active().current_hp, 150);
    assert_eq!(session.combatant(Side::B).expect("seated").active().current_hp, 120);
}

#[test]
fn certain_wake_chance_above_one_still_resolves() {
    let rules = Rules {
        sleep_wake_chance: 1.5,
        ..Rules::deterministic_damage()
    };
    let mut lead = make_mon("alice-lead", 200, 120, vec![tap()]);
    lead.set_status(StatusCondition::Sleep);
    let alice = Combatant::new("alice", vec![lead]).expect("roster");
    let mut session = BattleSession::with_seed(SessionId(2), rules, 5);
    session.attach("alice", alice).expect("seated");
    session.attach("bob", pair("bob", 10)).expect("seated");
    let lines = resolve(&mut session, Action::Attack(0), Action::Attack(0));
    assert_eq!(lines[0], "alice-lead woke up!");
    assert_eq!(lines[1], "bob-lead used Tap!");
    let alice = session.combatant(Side::A).expect("seated");
    assert_eq!(alice.active().condition(), None);
}

#[test]
fn last_creature_fainting_ends_the_battle() {
    let alice = Combatant::new("alice", vec![make_mon("alice-lead", 200, 120, vec![tap()])]).expect("roster");
    let bob = Combatant::new("bob", vec![make_mon("bob-lead", 5, 10, vec![tap()])]).expect("roster");
    let mut session = session_with(alice, bob);
    session.submit_move("alice", Action::Attack(0)).expect("accepted");
    session.submit_move("bob", Action::Attack(0)).expect("accepted");
    let dispatches = session.resolve_turn().expect("resolves");

    assert!(session.is_terminal());
    assert_eq!(session.winner(), Some(Side::A));
    let outcome = dispatches[1].report.outcome.clone().expect("announced");
    assert_eq!(outcome.winner.as_deref(), Some("alice"));
    assert_eq!(outcome.sprites, vec!["front/alice-lead.png".to_string()]);
    assert_eq!(session.combatant(Side::B).expect("seated").remaining(), 0);

    assert_eq!(session.submit_move("alice", Action::Attack(0)), Err(BattleError::Terminal));
    assert_eq!(session.attach("carol", pair("carol", 1)), Err(BattleError::Terminal));
    assert_eq!(session.resolve_replacement("bob", 0), Err(BattleError::Terminal));
}

fn burned_lead(name: &str, hp: u32, spe: u32) -> Creature {
    let mut creature = make_mon(name, hp, spe, vec![tap()]);
    creature.set_status(StatusCondition::Burn);
    creature
}

#[test]
fn simultaneous_faints_wait_for_both_replacements() {
    let alice = Combatant::new(
        "alice",
        vec![burned_lead("alice-lead", 1, 120), make_mon("alice-back", 200, 120, vec![tap()])],
    )
    .expect("roster");
    let bob = Combatant::new(
        "bob",
        vec![make_mon("bob-lead", 10, 10, vec![tap()]), make_mon("bob-back", 200, 10, vec![tap()])],
    )
    .expect("roster");
    let mut session = session_with(alice, bob);
    let lines = resolve(&mut session, Action::Attack(0), Action::Attack(0));
    assert!(lines.contains(&"alice-lead fainted!".to_string()));
    assert!(lines.contains(&"bob-lead fainted!".to_string()));
    assert_eq!(session.phase(), Phase::AwaitingReplacement);

    assert_eq!(
        session.submit_move("alice", Action::Attack(0)),
        Err(BattleError::Protocol(ProtocolError::AwaitingReplacement))
    );
    assert!(matches!(
        session.resolve_replacement("alice", 0),
        Err(BattleError::Validation(ValidationError::SameCreatureSwitch { .. }))
    ));

    let waiting = session.resolve_replacement("alice", 1).expect("buffered");
    assert!(waiting.is_empty());
    assert_eq!(session.phase(), Phase::AwaitingReplacement);

    let dispatches = session.resolve_replacement("bob", 1).expect("applied");
    assert_eq!(
        dispatches[0].report.lines,
        vec![
            "alice sent out alice-back!".to_string(),
            "bob sent out bob-back!".to_string(),
        ]
    );
    assert_eq!(session.phase(), Phase::InProgress);
    assert_eq!(
        session.resolve_replacement("alice", 1),
        Err(BattleError::Protocol(ProtocolError::NoReplacementPending("alice".to_string())))
    );
}

#[test]
fn wiping_out_together_is_a_draw() {
    let alice = Combatant::new("alice", vec![burned_lead("alice-lead", 1, 120)]).expect("roster");
    let bob = Combatant::new("bob", vec![make_mon("bob-lead", 10, 10, vec![tap()])]).expect("roster");
    let mut session = session_with(alice, bob);
    let lines = resolve(&mut session, Action::Attack(0), Action::Attack(0));
    assert!(session.is_terminal());
    assert_eq!(session.ending(), Some(Ending::Draw));
    assert_eq!(session.winner(), None);
    assert_eq!(lines.last().map(String::as_str), Some("The battle ended in a draw!"));
}

#[test]
fn remaining_count_only_decreases() {
    let mut session = session_with(pair("alice", 80), pair("bob", 40));
    let mut last = [2usize, 2usize];
    for _ in 0..200 {
        if session.is_terminal() {
            break;
        }
        match session.phase() {
            Phase::AwaitingReplacement => {
                for (side, token) in [(Side::A, "alice"), (Side::B, "bob")] {
                    if session.needs_replacement(token) {
                        let bench = session
                            .combatant(side)
                            .and_then(|c| c.first_healthy_bench())
                            .expect("a healthy creature remains");
                        session.resolve_replacement(token, bench).expect("replacement accepted");
                    }
                }
            }
            _ => {
                resolve(&mut session, Action::Attack(0), Action::Attack(0));
            }
        }
        for side in Side::BOTH {
            let now = session.combatant(side).expect("seated").remaining();
            assert!(now <= last[side.index()]);
            last[side.index()] = now;
        }
    }
    assert!(session.is_terminal());
    assert_eq!(session.winner(), Some(Side::A));
}
