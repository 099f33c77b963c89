use crate::error::SummaryError;
use crate::legacy::{legacy_member_id, LEGACY_FINAL_SET_TIEBREAK, LEGACY_TIEBREAK_AT};
use crate::payload::Node;
use crate::summary::{
    GamePoint, MatchFormat, MatchStatus, MatchSummary, MatchType, Participant, ParticipantKind,
    PointDisplay, Position, ScoreState, ServerState, Side, Stats, TeamMember,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Builds the `not-started` summary for a freshly configured match.
///
/// Singles setups carry `player1`/`player2` names, doubles setups carry
/// `team1`/`team2` as two-name arrays. Both carry `selectedSets` (best-of).
pub fn new_match_summary(payload: &Value) -> Result<MatchSummary, SummaryError> {
    let root = Node::root(payload);

    let type_node = root.req("matchType")?;
    let match_type = match type_node.str()? {
        "singles" => MatchType::Singles,
        "doubles" => MatchType::Doubles,
        other => {
            return Err(type_node.fail(format!("expected \"singles\" or \"doubles\", found {other:?}")))
        }
    };

    let sets_node = root.req("selectedSets")?;
    let selected = sets_node.u32()?;
    let format = MatchFormat::from_best_of(selected, LEGACY_TIEBREAK_AT, LEGACY_FINAL_SET_TIEBREAK)
        .ok_or_else(|| sets_node.fail(format!("{selected} is not an odd best-of count")))?;

    let participants = if match_type.is_team() {
        [
            setup_team(&root.req("team1")?, Side::One)?,
            setup_team(&root.req("team2")?, Side::Two)?,
        ]
    } else {
        [
            setup_player(&root.req("player1")?)?,
            setup_player(&root.req("player2")?)?,
        ]
    };

    let summary = MatchSummary {
        format,
        status: MatchStatus::NotStarted,
        match_type,
        score: ScoreState {
            sets_won: [0, 0],
            set_history: Vec::new(),
            games: [0, 0],
            points: PointDisplay::Game([GamePoint::Love; 2]),
            server: ServerState::default(),
        },
        participants,
        winning_side: None,
        match_score_text: String::new(),
    };
    summary.validate()?;
    tracing::debug!(
        match_type = match_type.as_str(),
        best_of = selected,
        "built new match summary"
    );
    Ok(summary)
}

fn setup_name(node: &Node<'_>) -> Result<String, SummaryError> {
    let name = node.str()?.trim();
    if name.is_empty() {
        return Err(node.fail("name is empty"));
    }
    Ok(name.to_string())
}

fn setup_player(node: &Node<'_>) -> Result<Participant, SummaryError> {
    Ok(Participant {
        identity: ParticipantKind::SinglePlayer { name: setup_name(node)? },
        stats: Stats::default(),
        per_player_stats: None,
    })
}

fn setup_team(node: &Node<'_>, side: Side) -> Result<Participant, SummaryError> {
    let [first, second] = node.pair()?;
    let a = TeamMember {
        id: legacy_member_id(side, Position::A),
        name: setup_name(&first)?,
        position: Position::A,
    };
    let b = TeamMember {
        id: legacy_member_id(side, Position::B),
        name: setup_name(&second)?,
        position: Position::B,
    };
    let per_player: BTreeMap<String, Stats> = [a.id.clone(), b.id.clone()]
        .into_iter()
        .map(|id| (id, Stats::default()))
        .collect();
    Ok(Participant {
        identity: ParticipantKind::Team {
            name: format!("{} / {}", a.name, b.name),
            members: [a, b],
        },
        stats: Stats::default(),
        per_player_stats: Some(per_player),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_payload;
    use serde_json::json;

    fn singles_setup() -> Value {
        json!({ "matchType": "singles", "player1": "Sabalenka", "player2": "Rybakina", "selectedSets": 3 })
    }

    fn doubles_setup() -> Value {
        json!({
            "matchType": "doubles",
            "team1": ["Ram", "Salisbury"],
            "team2": ["Koolhof", "Skupski"],
            "selectedSets": 5
        })
    }

    #[test]
    fn test_singles_setup_is_not_started() {
        let summary = new_match_summary(&singles_setup()).unwrap();
        assert_eq!(summary.status, MatchStatus::NotStarted);
        assert_eq!(summary.match_type, MatchType::Singles);
        assert_eq!(summary.format.sets_to_win, 2);
        assert_eq!(summary.display_name(Side::One), "Sabalenka");
        assert_eq!(summary.display_name(Side::Two), "Rybakina");
        assert_eq!(summary.score.server.current, None);
        assert_eq!(summary.winning_side, None);
        assert_eq!(summary.point_label(Side::One), "0");
    }

    #[test]
    fn test_doubles_setup_uses_side_position_ids() {
        let summary = new_match_summary(&doubles_setup()).unwrap();
        assert_eq!(summary.match_type, MatchType::Doubles);
        assert_eq!(summary.format.sets_to_win, 3);
        assert_eq!(summary.member_ids(), vec!["1a", "1b", "2a", "2b"]);
        assert_eq!(summary.display_name(Side::Two), "Koolhof / Skupski");
        let per_player = summary.participant(Side::One).per_player_stats.as_ref().unwrap();
        assert_eq!(per_player["1b"], Stats::default());
    }

    #[test]
    fn test_setup_summary_normalizes_to_itself() {
        for setup in [singles_setup(), doubles_setup()] {
            let summary = new_match_summary(&setup).unwrap();
            let emitted = serde_json::to_value(&summary).unwrap();
            assert_eq!(normalize_payload(&emitted).unwrap(), summary);
        }
    }

    #[test]
    fn test_even_selected_sets_rejected() {
        let mut setup = singles_setup();
        setup["selectedSets"] = json!(2);
        let err = new_match_summary(&setup).unwrap_err();
        assert_eq!(err.path(), Some("selectedSets"));
    }

    #[test]
    fn test_team_needs_two_names() {
        let mut setup = doubles_setup();
        setup["team2"] = json!(["Koolhof"]);
        let err = new_match_summary(&setup).unwrap_err();
        assert_eq!(err.path(), Some("team2"));

        setup["team2"] = json!(["Koolhof", "  "]);
        let err = new_match_summary(&setup).unwrap_err();
        assert_eq!(err.path(), Some("team2[1]"));
    }

    #[test]
    fn test_unknown_match_type_rejected() {
        let mut setup = singles_setup();
        setup["matchType"] = json!("mixed-doubles");
        let err = new_match_summary(&setup).unwrap_err();
        assert_eq!(err.path(), Some("matchType"));
    }
}
