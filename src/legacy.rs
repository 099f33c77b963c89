use crate::detect::legacy_match_type;
use crate::error::SummaryError;
use crate::payload::{value_to_side_number, Node};
use crate::summary::{
    GamePoint, MatchFormat, MatchStatus, MatchSummary, MatchType, Participant, ParticipantKind,
    PointDisplay, Position, RallyStats, ReturningStats, ScoreState, ServerState, ServingStats, Side,
    Stats, TeamMember,
};
use serde_json::Value;
use std::collections::BTreeMap;

// Legacy snapshots carry no tiebreak configuration.
pub(crate) const LEGACY_TIEBREAK_AT: u32 = 6;
pub(crate) const LEGACY_FINAL_SET_TIEBREAK: bool = true;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegacyPointType {
    Game,
    Tiebreak,
}

/// Maps a legacy snapshot (`player1`/`player2` or `team1`/`team2`) onto the canonical summary.
pub fn normalize_legacy(payload: &Value) -> Result<MatchSummary, SummaryError> {
    let root = Node::root(payload);
    let meta = root.req("meta")?;

    let point_type = match meta.req_str("type")? {
        "Game" => LegacyPointType::Game,
        "Tiebreak" => LegacyPointType::Tiebreak,
        other => {
            return Err(SummaryError::validation(
                "meta.type",
                format!("expected \"Game\" or \"Tiebreak\", found {other:?}"),
            ))
        }
    };

    let num_sets_node = meta.req("numSets")?;
    let num_sets = num_sets_node.u32()?;
    let format = MatchFormat::from_best_of(num_sets, LEGACY_TIEBREAK_AT, LEGACY_FINAL_SET_TIEBREAK)
        .ok_or_else(|| num_sets_node.fail(format!("{num_sets} is not an odd best-of count")))?;

    let match_type = legacy_match_type(payload);

    let reported_winner = match root.opt("winner") {
        Some(node) => Some(
            value_to_side_number(node.value())
                .and_then(Side::from_number)
                .ok_or_else(|| node.fail("expected 1 or 2"))?,
        ),
        None => None,
    };

    let status = match meta.opt("status") {
        Some(node) => {
            let raw = node.str()?;
            MatchStatus::parse(raw).ok_or_else(|| node.fail(format!("unknown status {raw:?}")))?
        }
        None if reported_winner.is_some() => MatchStatus::Completed,
        None => MatchStatus::InProgress,
    };
    // A winner on a live snapshot is stale; only terminal matches keep it.
    let winning_side = reported_winner.filter(|_| status.is_terminal());

    let side_keys = if match_type.is_team() {
        ["team1", "team2"]
    } else {
        ["player1", "player2"]
    };
    let side_nodes = [root.req(side_keys[0])?, root.req(side_keys[1])?];

    let mut sets_won = [0u32; 2];
    let mut games = [0u32; 2];
    let mut point_text = [String::new(), String::new()];
    for side in Side::BOTH {
        let node = &side_nodes[side.index()];
        sets_won[side.index()] = node.req_u32("sets")?;
        games[side.index()] = node.req_u32("games")?;
        point_text[side.index()] = legacy_point_text(&node.req("points")?)?;
    }
    let points = legacy_points(point_type, &point_text, &side_nodes)?;

    let participants = [
        legacy_participant(&meta, &side_nodes[0], Side::One, match_type)?,
        legacy_participant(&meta, &side_nodes[1], Side::Two, match_type)?,
    ];

    let current = if status == MatchStatus::InProgress {
        legacy_current_server(&meta, match_type)?
    } else {
        None
    };

    let score = ScoreState {
        sets_won,
        set_history: Vec::new(),
        games,
        points,
        server: ServerState { current, rotation: None },
    };

    let match_score_text = match root.opt("matchScore") {
        Some(node) => node.str()?.to_string(),
        None => score.render_text(status),
    };

    let summary = MatchSummary {
        format,
        status,
        match_type,
        score,
        participants,
        winning_side,
        match_score_text,
    };
    summary.validate()?;
    tracing::debug!(
        match_type = match_type.as_str(),
        status = status.as_str(),
        "normalized legacy match payload"
    );
    Ok(summary)
}

fn legacy_point_text(node: &Node<'_>) -> Result<String, SummaryError> {
    match node.value() {
        Value::String(raw) => Ok(raw.trim().to_string()),
        Value::Number(_) => Ok(node.u32()?.to_string()),
        _ => Err(node.fail("expected a point label")),
    }
}

fn legacy_points(
    point_type: LegacyPointType,
    text: &[String; 2],
    side_nodes: &[Node<'_>; 2],
) -> Result<PointDisplay, SummaryError> {
    let path = |side: Side| format!("{}.points", side_nodes[side.index()].path());
    match point_type {
        LegacyPointType::Game => {
            let mut points = [GamePoint::Love; 2];
            for side in Side::BOTH {
                let raw = &text[side.index()];
                points[side.index()] = GamePoint::parse(raw).ok_or_else(|| {
                    SummaryError::validation(path(side), format!("{raw:?} is not a game point label"))
                })?;
            }
            Ok(PointDisplay::Game(points))
        }
        LegacyPointType::Tiebreak => {
            let mut points = [0u32; 2];
            for side in Side::BOTH {
                let raw = &text[side.index()];
                points[side.index()] = raw.parse::<u32>().map_err(|_| {
                    SummaryError::validation(path(side), format!("{raw:?} is not a tiebreak point count"))
                })?;
            }
            Ok(PointDisplay::Tiebreak(points))
        }
    }
}

fn legacy_participant(
    meta: &Node<'_>,
    node: &Node<'_>,
    side: Side,
    match_type: MatchType,
) -> Result<Participant, SummaryError> {
    if !match_type.is_team() {
        let name = meta
            .opt("player")
            .and_then(|names| names.opt(&side.number().to_string()))
            .map(|name| name.str().map(|raw| raw.to_string()))
            .transpose()?
            .unwrap_or_else(|| format!("Player {}", side.number()));
        return Ok(Participant {
            identity: ParticipantKind::SinglePlayer { name },
            stats: legacy_stats(&node.req("stats")?)?,
            per_player_stats: None,
        });
    }

    let players = node.req("players")?;
    let mut members = Vec::with_capacity(2);
    let mut per_player = BTreeMap::new();
    for position in [Position::A, Position::B] {
        let player = players.req(position.label())?;
        let member = TeamMember {
            id: legacy_member_id(side, position),
            name: player.req_str("name")?.to_string(),
            position,
        };
        per_player.insert(member.id.clone(), legacy_stats(&player.req("stats")?)?);
        members.push(member);
    }
    let [a, b]: [TeamMember; 2] = members
        .try_into()
        .map_err(|_| players.fail("expected players A and B"))?;

    let stats = per_player
        .get(&a.id)
        .zip(per_player.get(&b.id))
        .and_then(|(a_stats, b_stats)| a_stats.combined(b_stats))
        .ok_or_else(|| players.fail("team stats overflow"))?;

    Ok(Participant {
        identity: ParticipantKind::Team {
            name: format!("{} / {}", a.name, b.name),
            members: [a, b],
        },
        stats,
        per_player_stats: Some(per_player),
    })
}

/// Stable sub-player id for legacy doubles, e.g. `"1a"`.
pub fn legacy_member_id(side: Side, position: Position) -> String {
    format!("{}{}", side.number(), position.label().to_lowercase())
}

fn legacy_stats(node: &Node<'_>) -> Result<Stats, SummaryError> {
    Ok(Stats {
        points_won: node.req_u32("points_won")?,
        points_played: node.req_u32("points_played")?,
        serving: ServingStats {
            aces: node.req_u32("ace")?,
            double_faults: node.req_u32("double_fault")?,
            service_winners: node.req_u32("service_winner")?,
            first_serve_percentage: None,
        },
        returning: ReturningStats {
            return_winners: node.req_u32("return_winner")?,
            break_points_won: node.req_u32("break_point_won")?,
            break_points_played: node.req_u32("break_point_played")?,
        },
        rally: RallyStats {
            winners: node.req_u32("winner")?,
            unforced_errors: node.req_u32("unforced_error")?,
        },
    })
}

fn legacy_current_server(meta: &Node<'_>, match_type: MatchType) -> Result<Option<String>, SummaryError> {
    if match_type.is_team() {
        let Some(current) = meta.opt("currentServer") else {
            return Ok(None);
        };
        let team = current.req("team")?;
        let side = value_to_side_number(team.value())
            .and_then(Side::from_number)
            .ok_or_else(|| team.fail("expected team 1 or 2"))?;
        let position_node = current.req("position")?;
        let raw = position_node.str()?;
        let position = Position::parse(raw)
            .ok_or_else(|| position_node.fail(format!("expected \"A\" or \"B\", found {raw:?}")))?;
        return Ok(Some(legacy_member_id(side, position)));
    }

    match meta.opt("server") {
        Some(node) => {
            let side = value_to_side_number(node.value())
                .and_then(Side::from_number)
                .ok_or_else(|| node.fail("expected 1 or 2"))?;
            Ok(Some(side.number().to_string()))
        }
        None => Ok(None),
    }
}
