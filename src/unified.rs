use crate::error::SummaryError;
use crate::payload::{value_to_side_number, Node};
use crate::summary::{
    GamePoint, MatchFormat, MatchStatus, MatchSummary, MatchType, Participant, ParticipantKind,
    PointDisplay, Position, RallyStats, ReturningStats, ScoreState, ServerState, ServingStats, Side,
    Stats, TeamMember,
};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Maps a unified snapshot onto the canonical summary. The shapes are close,
/// so this is mostly typed reading plus validation.
pub fn normalize_unified(payload: &Value) -> Result<MatchSummary, SummaryError> {
    let root = Node::root(payload);
    let meta = root.req("meta")?;

    let match_type_node = meta.req("matchType")?;
    let raw = match_type_node.str()?;
    let match_type = MatchType::parse(raw)
        .ok_or_else(|| match_type_node.fail(format!("unknown match type {raw:?}")))?;

    let status_node = meta.req("status")?;
    let raw = status_node.str()?;
    let status = MatchStatus::parse(raw).ok_or_else(|| status_node.fail(format!("unknown status {raw:?}")))?;

    let format_node = meta.req("format")?;
    let best_of_node = format_node.req("sets")?;
    let best_of = best_of_node.u32()?;
    let format = MatchFormat::from_best_of(
        best_of,
        format_node.req_u32("tiebreakAt")?,
        format_node.req_bool("finalSetTiebreak")?,
    )
    .ok_or_else(|| best_of_node.fail(format!("{best_of} is not an odd best-of count")))?;

    let score_node = root.req("score")?;
    let sets_won = read_u32_pair(&score_node.req("sets")?)?;
    let games = read_u32_pair(&score_node.req("games")?)?;
    let points = read_points(&score_node.req("points")?)?;
    let server = read_server(&score_node.req("server")?)?;

    let winning_side = match score_node.opt("winner") {
        Some(node) => Some(
            value_to_side_number(node.value())
                .and_then(Side::from_number)
                .ok_or_else(|| node.fail("expected 1, 2 or null"))?,
        ),
        None => None,
    };

    let set_history = match root.opt("setHistory") {
        Some(node) => node
            .items()?
            .iter()
            .map(read_u32_pair)
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    let participants_node = root.req("participants")?;
    let participants = [
        read_participant(&participants_node.req("1")?)?,
        read_participant(&participants_node.req("2")?)?,
    ];

    let summary = MatchSummary {
        format,
        status,
        match_type,
        score: ScoreState {
            sets_won,
            set_history,
            games,
            points,
            server,
        },
        participants,
        winning_side,
        match_score_text: root.req_str("matchScore")?.to_string(),
    };
    summary.validate()?;
    tracing::debug!(
        match_type = match_type.as_str(),
        status = status.as_str(),
        "normalized unified match payload"
    );
    Ok(summary)
}

fn read_u32_pair(node: &Node<'_>) -> Result<[u32; 2], SummaryError> {
    let [first, second] = node.pair()?;
    Ok([first.u32()?, second.u32()?])
}

fn read_points(node: &Node<'_>) -> Result<PointDisplay, SummaryError> {
    let type_node = node.req("type")?;
    let values = node.req("values")?.pair()?;
    match type_node.str()? {
        "game" => {
            let mut points = [GamePoint::Love; 2];
            for (idx, value) in values.iter().enumerate() {
                let label = match value.value() {
                    Value::String(raw) => raw.clone(),
                    Value::Number(_) => value.u32()?.to_string(),
                    _ => return Err(value.fail("expected a game point label")),
                };
                points[idx] = GamePoint::parse(&label)
                    .ok_or_else(|| value.fail(format!("{label:?} is not a game point label")))?;
            }
            Ok(PointDisplay::Game(points))
        }
        "tiebreak" => {
            let mut points = [0u32; 2];
            for (idx, value) in values.iter().enumerate() {
                points[idx] = match value.value() {
                    Value::String(raw) => raw
                        .trim()
                        .parse::<u32>()
                        .map_err(|_| value.fail(format!("{raw:?} is not a tiebreak point count")))?,
                    _ => value.u32()?,
                };
            }
            Ok(PointDisplay::Tiebreak(points))
        }
        other => Err(type_node.fail(format!("expected \"game\" or \"tiebreak\", found {other:?}"))),
    }
}

fn read_server(node: &Node<'_>) -> Result<ServerState, SummaryError> {
    let current_node = node
        .raw("current")
        .ok_or_else(|| SummaryError::validation(format!("{}.current", node.path()), "missing required field"))?;
    let current = if current_node.is_null() {
        None
    } else {
        Some(current_node.str()?.to_string())
    };
    let rotation = match node.opt("rotation") {
        Some(rotation) => Some(
            rotation
                .items()?
                .iter()
                .map(|item| item.str().map(|id| id.to_string()))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        None => None,
    };
    Ok(ServerState { current, rotation })
}

fn read_participant(node: &Node<'_>) -> Result<Participant, SummaryError> {
    let info = node.req("info")?;
    let name = info.req_str("name")?.to_string();
    let type_node = info.req("type")?;
    let identity = match type_node.str()? {
        "player" => ParticipantKind::SinglePlayer { name },
        "team" => {
            let players = info.req("players")?;
            ParticipantKind::Team {
                name,
                members: [
                    read_member(&players.req("a")?, Position::A)?,
                    read_member(&players.req("b")?, Position::B)?,
                ],
            }
        }
        other => return Err(type_node.fail(format!("expected \"player\" or \"team\", found {other:?}"))),
    };

    let stats_node = node.req("stats")?;
    let per_player_stats = match stats_node.opt("playerStats") {
        Some(map) => Some(
            map.entries()?
                .into_iter()
                .map(|(id, stats)| read_stats(&stats).map(|stats| (id.to_string(), stats)))
                .collect::<Result<BTreeMap<_, _>, _>>()?,
        ),
        None => None,
    };

    Ok(Participant {
        identity,
        stats: read_stats(&stats_node)?,
        per_player_stats,
    })
}

fn read_member(node: &Node<'_>, position: Position) -> Result<TeamMember, SummaryError> {
    Ok(TeamMember {
        id: node.req_str("id")?.to_string(),
        name: node.req_str("name")?.to_string(),
        position,
    })
}

fn read_stats(node: &Node<'_>) -> Result<Stats, SummaryError> {
    let serving = node.req("serving")?;
    let returning = node.req("returning")?;
    let rally = node.req("rally")?;
    Ok(Stats {
        points_won: node.req_u32("pointsWon")?,
        points_played: node.req_u32("pointsPlayed")?,
        serving: ServingStats {
            aces: serving.req_u32("aces")?,
            double_faults: serving.req_u32("doubleFaults")?,
            service_winners: serving.req_u32("serviceWinners")?,
            first_serve_percentage: serving
                .opt("firstServePercentage")
                .map(|pct| pct.f64())
                .transpose()?,
        },
        returning: ReturningStats {
            return_winners: returning.req_u32("returnWinners")?,
            break_points_won: returning.req_u32("breakPointsWon")?,
            break_points_played: returning.req_u32("breakPointsPlayed")?,
        },
        rally: RallyStats {
            winners: rally.req_u32("winners")?,
            unforced_errors: rally.req_u32("unforcedErrors")?,
        },
    })
}

// ── Encoding ───────────────────────────────────────────────────────────

/// Writes a canonical summary back out in the unified wire shape.
/// `normalize_unified(&to_unified_value(s))` yields `s` again.
pub fn to_unified_value(summary: &MatchSummary) -> Value {
    let points = match summary.score.points {
        PointDisplay::Game(points) => json!({
            "values": [points[0].label(), points[1].label()],
            "type": "game",
        }),
        PointDisplay::Tiebreak(points) => json!({
            "values": [points[0], points[1]],
            "type": "tiebreak",
        }),
    };

    let mut server = Map::new();
    server.insert(
        "current".to_string(),
        summary
            .score
            .server
            .current
            .as_ref()
            .map(|id| Value::String(id.clone()))
            .unwrap_or(Value::Null),
    );
    if let Some(rotation) = &summary.score.server.rotation {
        server.insert("rotation".to_string(), json!(rotation));
    }

    let mut participants = Map::new();
    for side in Side::BOTH {
        participants.insert(side.number().to_string(), encode_participant(summary.participant(side)));
    }

    json!({
        "meta": {
            "matchType": summary.match_type.as_str(),
            "status": summary.status.as_str(),
            "format": {
                "sets": summary.format.best_of(),
                "tiebreakAt": summary.format.tiebreak_at,
                "finalSetTiebreak": summary.format.final_set_tiebreak,
            },
        },
        "score": {
            "sets": summary.score.sets_won,
            "games": summary.score.games,
            "points": points,
            "server": Value::Object(server),
            "winner": summary.winning_side.map(|side| side.number()),
        },
        "participants": Value::Object(participants),
        "matchScore": summary.match_score_text,
        "setHistory": summary.score.set_history,
    })
}

fn encode_participant(participant: &Participant) -> Value {
    let info = match &participant.identity {
        ParticipantKind::SinglePlayer { name } => json!({ "name": name, "type": "player" }),
        ParticipantKind::Team { name, members } => json!({
            "name": name,
            "type": "team",
            "players": {
                "a": { "id": members[0].id, "name": members[0].name },
                "b": { "id": members[1].id, "name": members[1].name },
            },
        }),
    };
    let mut stats = encode_stats(&participant.stats);
    if let (Some(per_player), Some(map)) = (&participant.per_player_stats, stats.as_object_mut()) {
        let encoded: Map<String, Value> = per_player
            .iter()
            .map(|(id, stats)| (id.clone(), encode_stats(stats)))
            .collect();
        map.insert("playerStats".to_string(), Value::Object(encoded));
    }
    json!({ "info": info, "stats": stats })
}

fn encode_stats(stats: &Stats) -> Value {
    let mut serving = json!({
        "aces": stats.serving.aces,
        "doubleFaults": stats.serving.double_faults,
        "serviceWinners": stats.serving.service_winners,
    });
    if let (Some(pct), Some(map)) = (stats.serving.first_serve_percentage, serving.as_object_mut()) {
        map.insert("firstServePercentage".to_string(), json!(pct));
    }
    json!({
        "pointsWon": stats.points_won,
        "pointsPlayed": stats.points_played,
        "serving": serving,
        "returning": {
            "returnWinners": stats.returning.return_winners,
            "breakPointsWon": stats.returning.break_points_won,
            "breakPointsPlayed": stats.returning.break_points_played,
        },
        "rally": {
            "winners": stats.rally.winners,
            "unforcedErrors": stats.rally.unforced_errors,
        },
    })
}
