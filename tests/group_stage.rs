//! Integration tests for the group stage: results, qualification and seeding.

mod common;

use common::{round_robin, team, team1_wins, Fixture};
use racquet_tournament::models::{Competitor, Round, TournamentFormat};
use racquet_tournament::store::{ParticipantPatch, TournamentStore};
use std::collections::HashSet;

/// Groups where the earlier-registered team always wins.
async fn play_groups(f: &Fixture, groups: &[(char, Vec<uuid::Uuid>)]) {
    for (label, ids) in groups {
        let matches = f.insert_round(Round::Group(*label), round_robin(ids)).await;
        for m in matches {
            f.engine.record_result(m.id, team1_wins()).await.unwrap();
        }
    }
}

#[tokio::test]
async fn two_groups_of_four_seed_crossed_semifinals() {
    let f = Fixture::new(TournamentFormat::GroupsKnockout);
    let a = f.teams(&["A1", "A2", "A3", "A4"], Some("A"));
    let b = f.teams(&["B1", "B2", "B3", "B4"], Some("B"));
    play_groups(&f, &[('A', a.clone()), ('B', b.clone())]).await;

    let (tid, cid) = f.ids();
    let outcome = f.engine.finish_group_stage(tid, cid).await.unwrap();
    assert_eq!(outcome.skipped, None);
    assert_eq!(outcome.qualified, vec![a[0], b[0], a[1], b[1]]);
    assert_eq!(outcome.matches_created, 2);

    let semis = f.round(Round::SemiFinal).await;
    assert_eq!(semis.len(), 2);
    assert_eq!(semis[0].team1, Some(team(a[0])));
    assert_eq!(semis[0].team2, Some(team(b[1])));
    assert_eq!(semis[1].team1, Some(team(b[0])));
    assert_eq!(semis[1].team2, Some(team(a[1])));
}

#[tokio::test]
async fn finishing_twice_creates_nothing_new() {
    let f = Fixture::new(TournamentFormat::GroupsKnockout);
    let a = f.teams(&["A1", "A2", "A3", "A4"], Some("A"));
    let b = f.teams(&["B1", "B2", "B3", "B4"], Some("B"));
    play_groups(&f, &[('A', a), ('B', b)]).await;

    let (tid, cid) = f.ids();
    f.engine.finish_group_stage(tid, cid).await.unwrap();
    let again = f.engine.finish_group_stage(tid, cid).await.unwrap();
    assert_eq!(again.matches_created, 0);
    assert!(again.skipped.is_some());
    assert_eq!(f.round(Round::SemiFinal).await.len(), 2);
}

#[tokio::test]
async fn best_thirds_fill_up_to_a_power_of_two() {
    let f = Fixture::new(TournamentFormat::GroupsKnockout);
    let a = f.teams(&["A1", "A2", "A3"], Some("A"));
    let b = f.teams(&["B1", "B2", "B3"], Some("B"));
    let c = f.teams(&["C1", "C2", "C3"], Some("C"));
    play_groups(&f, &[('A', a.clone()), ('B', b.clone()), ('C', c.clone())]).await;

    let (tid, cid) = f.ids();
    let outcome = f.engine.finish_group_stage(tid, cid).await.unwrap();
    assert_eq!(outcome.qualified.len(), 8);
    assert_eq!(&outcome.qualified[..6], &[a[0], b[0], c[0], a[1], b[1], c[1]]);
    let thirds: HashSet<_> = [a[2], b[2], c[2]].into_iter().collect();
    assert!(outcome.qualified[6..].iter().all(|id| thirds.contains(id)));
    assert_eq!(f.round(Round::QuarterFinal).await.len(), 4);
}

#[tokio::test]
async fn missing_group_names_are_taken_from_group_matches() {
    let f = Fixture::new(TournamentFormat::GroupsKnockout);
    let a = f.teams(&["A1", "A2", "A3", "A4"], Some("A"));
    let b = f.teams(&["B1", "B2", "B3", "B4"], Some("B"));
    f.engine
        .store()
        .update_participant(b[3], ParticipantPatch::group_name(None))
        .await
        .unwrap();
    play_groups(&f, &[('A', a), ('B', b.clone())]).await;

    let (tid, cid) = f.ids();
    f.engine.finish_group_stage(tid, cid).await.unwrap();
    let restored = f
        .participants()
        .await
        .into_iter()
        .find(|p| p.id == b[3])
        .and_then(|p| p.group_name);
    assert_eq!(restored.as_deref(), Some("B"));
}

#[tokio::test]
async fn individual_non_qualifiers_fill_the_fifth_place_tier() {
    let f = Fixture::with_category(TournamentFormat::IndividualGroupsKnockout, |c| {
        c.qualified_per_group = 4;
    });
    let mut everyone = Vec::new();
    for label in ['A', 'B'] {
        let g = label.to_string();
        let p = f.players(8, None, Some(&g));
        let pair = |x: usize, y: usize| Competitor::pair(p[x], p[y]);
        let matches = f
            .insert_round(
                Round::Group(label),
                vec![
                    (pair(0, 1), pair(6, 7)),
                    (pair(2, 3), pair(4, 5)),
                    (pair(0, 2), pair(1, 3)),
                    (pair(4, 6), pair(5, 7)),
                ],
            )
            .await;
        for m in matches {
            f.engine.record_result(m.id, team1_wins()).await.unwrap();
        }
        everyone.extend(p);
    }

    let (tid, cid) = f.ids();
    let outcome = f.engine.finish_group_stage(tid, cid).await.unwrap();
    assert_eq!(outcome.qualified.len(), 8);
    assert_eq!(outcome.matches_created, 4);

    let semis = f.round(Round::SemiFinal).await;
    assert_eq!(semis.len(), 2);
    let tier = f
        .round(Round::TierSemifinal(racquet_tournament::models::Tier::Fifth))
        .await;
    assert_eq!(tier.len(), 2);

    let qualified: HashSet<_> = outcome.qualified.iter().copied().collect();
    let in_semis: HashSet<_> = semis.iter().flat_map(|m| m.participants()).collect();
    assert_eq!(in_semis, qualified);
    let in_tier: HashSet<_> = tier.iter().flat_map(|m| m.participants()).collect();
    assert_eq!(in_tier.len(), 8);
    assert!(in_tier.is_disjoint(&qualified));
    assert_eq!(in_semis.len() + in_tier.len(), everyone.len());
}

#[tokio::test]
async fn too_few_qualifiers_is_a_logged_no_op() {
    let f = Fixture::with_category(TournamentFormat::GroupsKnockout, |c| {
        c.qualified_per_group = 3;
    });
    let a = f.teams(&["A1", "A2", "A3"], Some("A"));
    play_groups(&f, &[('A', a)]).await;

    let (tid, cid) = f.ids();
    let outcome = f.engine.finish_group_stage(tid, cid).await.unwrap();
    assert!(outcome.skipped.is_some());
    assert_eq!(outcome.matches_created, 0);
    assert!(f.matches().await.iter().all(|m| m.round.is_group()));
}
