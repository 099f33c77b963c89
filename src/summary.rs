use crate::error::SummaryError;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};

// ── Sides and format ───────────────────────────────────────────────────

/// One of the two competing entities; serialized as `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "u8")]
pub enum Side {
    One,
    Two,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::One, Side::Two];

    pub fn from_number(num: u8) -> Option<Side> {
        match num {
            1 => Some(Side::One),
            2 => Some(Side::Two),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Side::One => 1,
            Side::Two => 2,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::One => 0,
            Side::Two => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }
}

impl From<Side> for u8 {
    fn from(side: Side) -> u8 {
        side.number()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFormat {
    pub sets_to_win: u32,
    /// Game count at which a set tiebreak is played; 0 means no standard tiebreak.
    pub tiebreak_at: u32,
    pub final_set_tiebreak: bool,
}

impl MatchFormat {
    /// Converts the wire best-of count (1, 3, 5, ...) into sets-to-win.
    pub fn from_best_of(best_of: u32, tiebreak_at: u32, final_set_tiebreak: bool) -> Option<Self> {
        if best_of == 0 || best_of % 2 == 0 {
            return None;
        }
        Some(MatchFormat {
            sets_to_win: best_of / 2 + 1,
            tiebreak_at,
            final_set_tiebreak,
        })
    }

    pub fn best_of(&self) -> u32 {
        (self.sets_to_win * 2).saturating_sub(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStatus {
    NotStarted,
    InProgress,
    Completed,
    Retired,
    Walkover,
}

impl MatchStatus {
    pub fn parse(raw: &str) -> Option<MatchStatus> {
        match raw {
            "not-started" => Some(MatchStatus::NotStarted),
            "in-progress" => Some(MatchStatus::InProgress),
            "completed" => Some(MatchStatus::Completed),
            "retired" => Some(MatchStatus::Retired),
            "walkover" => Some(MatchStatus::Walkover),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::NotStarted => "not-started",
            MatchStatus::InProgress => "in-progress",
            MatchStatus::Completed => "completed",
            MatchStatus::Retired => "retired",
            MatchStatus::Walkover => "walkover",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            MatchStatus::Completed | MatchStatus::Retired | MatchStatus::Walkover
        )
    }

    /// Terminal statuses are one-way; re-sending the same terminal status is allowed.
    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        match self {
            MatchStatus::NotStarted => true,
            MatchStatus::InProgress => next != MatchStatus::NotStarted,
            terminal => terminal == next,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchType {
    Singles,
    Doubles,
    MixedDoubles,
}

impl MatchType {
    pub fn parse(raw: &str) -> Option<MatchType> {
        match raw {
            "singles" => Some(MatchType::Singles),
            "doubles" => Some(MatchType::Doubles),
            "mixed-doubles" => Some(MatchType::MixedDoubles),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::Singles => "singles",
            MatchType::Doubles => "doubles",
            MatchType::MixedDoubles => "mixed-doubles",
        }
    }

    pub fn is_team(self) -> bool {
        !matches!(self, MatchType::Singles)
    }
}

// ── Participants ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Position {
    A,
    B,
}

impl Position {
    pub fn parse(raw: &str) -> Option<Position> {
        match raw {
            "A" | "a" => Some(Position::A),
            "B" | "b" => Some(Position::B),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Position::A => "A",
            Position::B => "B",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ParticipantKind {
    SinglePlayer { name: String },
    /// Members are stored in position order: `[A, B]`.
    Team { name: String, members: [TeamMember; 2] },
}

impl ParticipantKind {
    pub fn name(&self) -> &str {
        match self {
            ParticipantKind::SinglePlayer { name } => name,
            ParticipantKind::Team { name, .. } => name,
        }
    }

    pub fn members(&self) -> Option<&[TeamMember; 2]> {
        match self {
            ParticipantKind::SinglePlayer { .. } => None,
            ParticipantKind::Team { members, .. } => Some(members),
        }
    }

    pub fn member(&self, position: Position) -> Option<&TeamMember> {
        self.members()?.iter().find(|member| member.position == position)
    }
}

// ── Stats ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServingStats {
    pub aces: u32,
    pub double_faults: u32,
    pub service_winners: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_serve_percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturningStats {
    pub return_winners: u32,
    pub break_points_won: u32,
    pub break_points_played: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RallyStats {
    pub winners: u32,
    pub unforced_errors: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub points_won: u32,
    pub points_played: u32,
    pub serving: ServingStats,
    pub returning: ReturningStats,
    pub rally: RallyStats,
}

impl Stats {
    /// Field-wise sum of two records. The percentage is dropped because it
    /// cannot be combined without the underlying serve counts.
    pub fn combined(&self, other: &Stats) -> Option<Stats> {
        Some(Stats {
            points_won: self.points_won.checked_add(other.points_won)?,
            points_played: self.points_played.checked_add(other.points_played)?,
            serving: ServingStats {
                aces: self.serving.aces.checked_add(other.serving.aces)?,
                double_faults: self.serving.double_faults.checked_add(other.serving.double_faults)?,
                service_winners: self
                    .serving
                    .service_winners
                    .checked_add(other.serving.service_winners)?,
                first_serve_percentage: None,
            },
            returning: ReturningStats {
                return_winners: self
                    .returning
                    .return_winners
                    .checked_add(other.returning.return_winners)?,
                break_points_won: self
                    .returning
                    .break_points_won
                    .checked_add(other.returning.break_points_won)?,
                break_points_played: self
                    .returning
                    .break_points_played
                    .checked_add(other.returning.break_points_played)?,
            },
            rally: RallyStats {
                winners: self.rally.winners.checked_add(other.rally.winners)?,
                unforced_errors: self.rally.unforced_errors.checked_add(other.rally.unforced_errors)?,
            },
        })
    }

    pub fn validate(&self, path: &str) -> Result<(), SummaryError> {
        if self.points_won > self.points_played {
            return Err(SummaryError::validation(
                format!("{path}.pointsWon"),
                format!(
                    "points won ({}) exceeds points played ({})",
                    self.points_won, self.points_played
                ),
            ));
        }
        if self.returning.break_points_won > self.returning.break_points_played {
            return Err(SummaryError::validation(
                format!("{path}.returning.breakPointsWon"),
                format!(
                    "break points won ({}) exceeds break points played ({})",
                    self.returning.break_points_won, self.returning.break_points_played
                ),
            ));
        }
        if let Some(pct) = self.serving.first_serve_percentage {
            if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
                return Err(SummaryError::validation(
                    format!("{path}.serving.firstServePercentage"),
                    format!("{pct} is outside [0, 100]"),
                ));
            }
        }
        Ok(())
    }
}

// ── Score ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GamePoint {
    #[serde(rename = "0")]
    Love,
    #[serde(rename = "15")]
    Fifteen,
    #[serde(rename = "30")]
    Thirty,
    #[serde(rename = "40")]
    Forty,
    #[serde(rename = "AD")]
    Advantage,
}

impl GamePoint {
    pub fn parse(raw: &str) -> Option<GamePoint> {
        match raw.trim() {
            "0" => Some(GamePoint::Love),
            "15" => Some(GamePoint::Fifteen),
            "30" => Some(GamePoint::Thirty),
            "40" => Some(GamePoint::Forty),
            "AD" => Some(GamePoint::Advantage),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GamePoint::Love => "0",
            GamePoint::Fifteen => "15",
            GamePoint::Thirty => "30",
            GamePoint::Forty => "40",
            GamePoint::Advantage => "AD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointsType {
    Game,
    Tiebreak,
}

impl PointsType {
    pub fn as_str(self) -> &'static str {
        match self {
            PointsType::Game => "game",
            PointsType::Tiebreak => "tiebreak",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum PointDisplay {
    Game([GamePoint; 2]),
    Tiebreak([u32; 2]),
}

impl PointDisplay {
    pub fn points_type(&self) -> PointsType {
        match self {
            PointDisplay::Game(_) => PointsType::Game,
            PointDisplay::Tiebreak(_) => PointsType::Tiebreak,
        }
    }

    /// Scoreboard label for one side.
    pub fn label(&self, side: Side) -> String {
        match self {
            PointDisplay::Game(points) => points[side.index()].label().to_string(),
            PointDisplay::Tiebreak(points) => points[side.index()].to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerState {
    /// `"1"`/`"2"` in singles, a sub-player id in team matches.
    pub current: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreState {
    pub sets_won: [u32; 2],
    /// Games per completed set, `[side1, side2]` per entry.
    pub set_history: Vec<[u32; 2]>,
    pub games: [u32; 2],
    pub points: PointDisplay,
    pub server: ServerState,
}

impl ScoreState {
    /// Games of every completed set for one side; both sides always have equal length.
    pub fn set_games(&self, side: Side) -> Vec<u32> {
        self.set_history.iter().map(|set| set[side.index()]).collect()
    }

    /// Scoreboard text such as `"6-4, 3-6, 2-1"`, used when the payload has none.
    pub fn render_text(&self, status: MatchStatus) -> String {
        let mut parts: Vec<String> = self
            .set_history
            .iter()
            .map(|set| format!("{}-{}", set[0], set[1]))
            .collect();
        if parts.is_empty() && self.sets_won != [0, 0] {
            parts.push(format!("Sets {}-{}", self.sets_won[0], self.sets_won[1]));
        }
        let live_games = self.games != [0, 0] || parts.is_empty();
        if !status.is_terminal() && live_games {
            parts.push(format!("{}-{}", self.games[0], self.games[1]));
        }
        parts.join(", ")
    }
}

// ── Match summary ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub identity: ParticipantKind,
    pub stats: Stats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_player_stats: Option<BTreeMap<String, Stats>>,
}

/// Canonical snapshot every consumer renders from, whichever wire shape produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSummary {
    pub format: MatchFormat,
    pub status: MatchStatus,
    pub match_type: MatchType,
    pub score: ScoreState,
    pub participants: [Participant; 2],
    pub winning_side: Option<Side>,
    pub match_score_text: String,
}

// Emitted summaries use the unified layout so they normalize back to themselves.
impl Serialize for MatchSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        crate::unified::to_unified_value(self).serialize(serializer)
    }
}

impl MatchSummary {
    pub fn participant(&self, side: Side) -> &Participant {
        &self.participants[side.index()]
    }

    pub fn display_name(&self, side: Side) -> &str {
        self.participant(side).identity.name()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn sets_won(&self, side: Side) -> u32 {
        self.score.sets_won[side.index()]
    }

    pub fn games(&self, side: Side) -> u32 {
        self.score.games[side.index()]
    }

    pub fn point_label(&self, side: Side) -> String {
        self.score.points.label(side)
    }

    /// Sub-player ids of every team member in the match, side 1 first.
    pub fn member_ids(&self) -> Vec<&str> {
        self.participants
            .iter()
            .filter_map(|participant| participant.identity.members())
            .flat_map(|members| members.iter().map(|member| member.id.as_str()))
            .collect()
    }

    /// Side that owns a server identifier, whether it names a side or a sub-player.
    pub fn side_of_server(&self, server_id: &str) -> Option<Side> {
        if self.match_type.is_team() {
            Side::BOTH.into_iter().find(|side| {
                self.participant(*side)
                    .identity
                    .members()
                    .map(|members| members.iter().any(|member| member.id == server_id))
                    .unwrap_or(false)
            })
        } else {
            server_id.parse::<u8>().ok().and_then(Side::from_number)
        }
    }

    pub fn serving_side(&self) -> Option<Side> {
        self.score
            .server
            .current
            .as_deref()
            .and_then(|current| self.side_of_server(current))
    }

    /// Serving team member in doubles; `None` in singles or when nobody serves.
    pub fn serving_member(&self) -> Option<&TeamMember> {
        let current = self.score.server.current.as_deref()?;
        self.participants
            .iter()
            .filter_map(|participant| participant.identity.members())
            .flat_map(|members| members.iter())
            .find(|member| member.id == current)
    }

    pub fn player_stats(&self, side: Side, member_id: &str) -> Option<&Stats> {
        self.participant(side).per_player_stats.as_ref()?.get(member_id)
    }

    /// Checks every renderability invariant; the first violation is returned as-is.
    pub fn validate(&self) -> Result<(), SummaryError> {
        if self.format.sets_to_win == 0 {
            return Err(SummaryError::validation(
                "meta.format.sets",
                "a match needs at least one set to win",
            ));
        }
        self.validate_participants()?;
        self.validate_sets()?;
        self.validate_points()?;
        self.validate_winner()?;
        self.validate_server()?;
        Ok(())
    }

    fn validate_participants(&self) -> Result<(), SummaryError> {
        let mut seen_ids = HashSet::new();
        for side in Side::BOTH {
            let path = format!("participants.{}", side.number());
            let participant = self.participant(side);
            participant.stats.validate(&format!("{path}.stats"))?;

            match (&participant.identity, self.match_type.is_team()) {
                (ParticipantKind::SinglePlayer { .. }, false) => {
                    if participant.per_player_stats.is_some() {
                        return Err(SummaryError::validation(
                            format!("{path}.stats.playerStats"),
                            "singles participants carry no per-player stats",
                        ));
                    }
                }
                (ParticipantKind::Team { members, .. }, true) => {
                    if members[0].position != Position::A || members[1].position != Position::B {
                        return Err(SummaryError::validation(
                            format!("{path}.info.players"),
                            "team members must hold positions A and B",
                        ));
                    }
                    for member in members {
                        if member.id.trim().is_empty() {
                            return Err(SummaryError::validation(
                                format!("{path}.info.players.{}.id", member.position.label().to_lowercase()),
                                "player id is empty",
                            ));
                        }
                        if !seen_ids.insert(member.id.as_str()) {
                            return Err(SummaryError::validation(
                                format!("{path}.info.players.{}.id", member.position.label().to_lowercase()),
                                format!("duplicate player id {:?}", member.id),
                            ));
                        }
                    }
                    if let Some(per_player) = &participant.per_player_stats {
                        let expected: HashSet<&str> = members.iter().map(|m| m.id.as_str()).collect();
                        let actual: HashSet<&str> = per_player.keys().map(|key| key.as_str()).collect();
                        if expected != actual {
                            return Err(SummaryError::validation(
                                format!("{path}.stats.playerStats"),
                                "per-player stats must be keyed by exactly the two team member ids",
                            ));
                        }
                        for (id, stats) in per_player {
                            stats.validate(&format!("{path}.stats.playerStats.{id}"))?;
                        }
                    }
                }
                (_, is_team) => {
                    let expected = if is_team { "team" } else { "player" };
                    return Err(SummaryError::validation(
                        format!("{path}.info.type"),
                        format!("{} matches require {expected} participants", self.match_type.as_str()),
                    ));
                }
            }
        }
        Ok(())
    }

    fn validate_sets(&self) -> Result<(), SummaryError> {
        let to_win = self.format.sets_to_win;
        for side in Side::BOTH {
            if self.sets_won(side) > to_win {
                return Err(SummaryError::validation(
                    format!("score.sets[{}]", side.index()),
                    format!("{} sets won exceeds the {to_win} needed to win", self.sets_won(side)),
                ));
            }
        }
        if self.score.sets_won == [to_win, to_win] {
            return Err(SummaryError::validation(
                "score.sets",
                "both sides cannot have won the match",
            ));
        }
        if self.score.set_history.is_empty() {
            return Ok(());
        }
        let mut tally = [0u32; 2];
        for (idx, set) in self.score.set_history.iter().enumerate() {
            let winner = match set[0].cmp(&set[1]) {
                std::cmp::Ordering::Greater => Side::One,
                std::cmp::Ordering::Less => Side::Two,
                std::cmp::Ordering::Equal => {
                    return Err(SummaryError::validation(
                        format!("setHistory[{idx}]"),
                        "a completed set cannot be tied",
                    ));
                }
            };
            tally[winner.index()] += 1;
        }
        if tally != self.score.sets_won {
            return Err(SummaryError::validation(
                "setHistory",
                format!(
                    "set history gives {}-{} but score.sets is {}-{}",
                    tally[0], tally[1], self.score.sets_won[0], self.score.sets_won[1]
                ),
            ));
        }
        Ok(())
    }

    fn validate_points(&self) -> Result<(), SummaryError> {
        if let PointDisplay::Game(points) = self.score.points {
            let advantage = points.iter().filter(|p| **p == GamePoint::Advantage).count();
            let valid = match advantage {
                0 => true,
                1 => points.contains(&GamePoint::Forty),
                _ => false,
            };
            if !valid {
                return Err(SummaryError::validation(
                    "score.points.values",
                    format!("{}-{} is not a reachable game score", points[0].label(), points[1].label()),
                ));
            }
        }
        Ok(())
    }

    fn validate_winner(&self) -> Result<(), SummaryError> {
        match (self.status, self.winning_side) {
            (status, Some(_)) if !status.is_terminal() => Err(SummaryError::validation(
                "score.winner",
                format!("a {} match has no winner", status.as_str()),
            )),
            (status, None) if status.is_terminal() => Err(SummaryError::validation(
                "score.winner",
                format!("a {} match needs a winning side", status.as_str()),
            )),
            (MatchStatus::Completed, Some(winner)) => {
                if self.sets_won(winner) > self.sets_won(winner.opponent()) {
                    Ok(())
                } else {
                    Err(SummaryError::validation(
                        "score.winner",
                        format!(
                            "side {} completed the match without winning more sets ({}-{})",
                            winner.number(),
                            self.sets_won(Side::One),
                            self.sets_won(Side::Two)
                        ),
                    ))
                }
            }
            _ => Ok(()),
        }
    }

    fn validate_server(&self) -> Result<(), SummaryError> {
        let server = &self.score.server;
        if let Some(current) = &server.current {
            if self.status != MatchStatus::InProgress {
                return Err(SummaryError::validation(
                    "score.server.current",
                    format!("a {} match has no current server", self.status.as_str()),
                ));
            }
            if self.side_of_server(current).is_none() {
                return Err(SummaryError::validation(
                    "score.server.current",
                    format!("{current:?} does not identify a server in this match"),
                ));
            }
        }
        if let Some(rotation) = &server.rotation {
            for (idx, id) in rotation.iter().enumerate() {
                if self.side_of_server(id).is_none() {
                    return Err(SummaryError::validation(
                        format!("score.server.rotation[{idx}]"),
                        format!("{id:?} does not identify a server in this match"),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn stats(points_won: u32, points_played: u32) -> Stats {
        Stats {
            points_won,
            points_played,
            serving: ServingStats {
                aces: 3,
                double_faults: 1,
                service_winners: 2,
                first_serve_percentage: None,
            },
            returning: ReturningStats {
                return_winners: 1,
                break_points_won: 1,
                break_points_played: 4,
            },
            rally: RallyStats {
                winners: 9,
                unforced_errors: 7,
            },
        }
    }

    pub(crate) fn singles_summary() -> MatchSummary {
        MatchSummary {
            format: MatchFormat {
                sets_to_win: 2,
                tiebreak_at: 6,
                final_set_tiebreak: true,
            },
            status: MatchStatus::InProgress,
            match_type: MatchType::Singles,
            score: ScoreState {
                sets_won: [1, 0],
                set_history: vec![[6, 4]],
                games: [2, 1],
                points: PointDisplay::Game([GamePoint::Thirty, GamePoint::Fifteen]),
                server: ServerState {
                    current: Some("1".to_string()),
                    rotation: None,
                },
            },
            participants: [
                Participant {
                    identity: ParticipantKind::SinglePlayer { name: "Alcaraz".to_string() },
                    stats: stats(40, 70),
                    per_player_stats: None,
                },
                Participant {
                    identity: ParticipantKind::SinglePlayer { name: "Sinner".to_string() },
                    stats: stats(30, 70),
                    per_player_stats: None,
                },
            ],
            winning_side: None,
            match_score_text: "6-4, 2-1".to_string(),
        }
    }

    #[test]
    fn test_valid_summary_passes() {
        assert!(singles_summary().validate().is_ok());
    }

    #[test]
    fn test_best_of_conversion() {
        let format = MatchFormat::from_best_of(5, 6, false).unwrap();
        assert_eq!(format.sets_to_win, 3);
        assert_eq!(format.best_of(), 5);
        assert!(MatchFormat::from_best_of(4, 6, true).is_none());
        assert!(MatchFormat::from_best_of(0, 6, true).is_none());
    }

    #[test]
    fn test_terminal_status_is_one_way() {
        assert!(MatchStatus::NotStarted.can_transition_to(MatchStatus::InProgress));
        assert!(MatchStatus::InProgress.can_transition_to(MatchStatus::Retired));
        assert!(!MatchStatus::InProgress.can_transition_to(MatchStatus::NotStarted));
        assert!(MatchStatus::Completed.can_transition_to(MatchStatus::Completed));
        assert!(!MatchStatus::Completed.can_transition_to(MatchStatus::InProgress));
        assert!(!MatchStatus::Walkover.can_transition_to(MatchStatus::Retired));
    }

    #[test]
    fn test_points_won_cannot_exceed_played() {
        let mut summary = singles_summary();
        summary.participants[1].stats.points_won = 71;
        let err = summary.validate().unwrap_err();
        assert_eq!(err.path(), Some("participants.2.stats.pointsWon"));
    }

    #[test]
    fn test_break_points_won_cannot_exceed_played() {
        let mut summary = singles_summary();
        summary.participants[0].stats.returning.break_points_won = 5;
        let err = summary.validate().unwrap_err();
        assert_eq!(err.path(), Some("participants.1.stats.returning.breakPointsWon"));
    }

    #[test]
    fn test_first_serve_percentage_range() {
        let mut summary = singles_summary();
        summary.participants[0].stats.serving.first_serve_percentage = Some(100.5);
        assert!(summary.validate().is_err());
        summary.participants[0].stats.serving.first_serve_percentage = Some(64.0);
        assert!(summary.validate().is_ok());
    }

    #[test]
    fn test_winner_requires_terminal_status() {
        let mut summary = singles_summary();
        summary.winning_side = Some(Side::One);
        let err = summary.validate().unwrap_err();
        assert_eq!(err.path(), Some("score.winner"));
    }

    #[test]
    fn test_completed_requires_more_sets() {
        let mut summary = singles_summary();
        summary.status = MatchStatus::Completed;
        summary.score.server.current = None;
        summary.winning_side = Some(Side::Two);
        assert!(summary.validate().is_err());
        summary.winning_side = Some(Side::One);
        assert!(summary.validate().is_ok());
        summary.winning_side = None;
        assert!(summary.validate().is_err());
    }

    #[test]
    fn test_retired_winner_may_trail_on_sets() {
        let mut summary = singles_summary();
        summary.status = MatchStatus::Retired;
        summary.score.server.current = None;
        summary.winning_side = Some(Side::Two);
        assert!(summary.validate().is_ok());
    }

    #[test]
    fn test_server_only_while_in_progress() {
        let mut summary = singles_summary();
        summary.status = MatchStatus::NotStarted;
        summary.score.sets_won = [0, 0];
        summary.score.set_history.clear();
        let err = summary.validate().unwrap_err();
        assert_eq!(err.path(), Some("score.server.current"));
    }

    #[test]
    fn test_unknown_server_id_rejected() {
        let mut summary = singles_summary();
        summary.score.server.current = Some("3".to_string());
        assert!(summary.validate().is_err());
    }

    #[test]
    fn test_history_must_match_sets_won() {
        let mut summary = singles_summary();
        summary.score.set_history = vec![[4, 6]];
        let err = summary.validate().unwrap_err();
        assert_eq!(err.path(), Some("setHistory"));
        summary.score.set_history = vec![[6, 6]];
        assert!(summary.validate().is_err());
    }

    #[test]
    fn test_double_advantage_rejected() {
        let mut summary = singles_summary();
        summary.score.points = PointDisplay::Game([GamePoint::Advantage, GamePoint::Advantage]);
        assert!(summary.validate().is_err());
        summary.score.points = PointDisplay::Game([GamePoint::Advantage, GamePoint::Thirty]);
        assert!(summary.validate().is_err());
        summary.score.points = PointDisplay::Game([GamePoint::Forty, GamePoint::Advantage]);
        assert!(summary.validate().is_ok());
    }

    #[test]
    fn test_singles_cannot_have_team_identity() {
        let mut summary = singles_summary();
        summary.participants[0].identity = ParticipantKind::Team {
            name: "A / B".to_string(),
            members: [
                TeamMember { id: "a".to_string(), name: "A".to_string(), position: Position::A },
                TeamMember { id: "b".to_string(), name: "B".to_string(), position: Position::B },
            ],
        };
        let err = summary.validate().unwrap_err();
        assert_eq!(err.path(), Some("participants.1.info.type"));
    }

    #[test]
    fn test_render_text() {
        let summary = singles_summary();
        assert_eq!(summary.score.render_text(MatchStatus::InProgress), "6-4, 2-1");
        assert_eq!(summary.score.render_text(MatchStatus::Completed), "6-4");

        let mut tally_only = summary.score.clone();
        tally_only.set_history.clear();
        tally_only.games = [0, 0];
        assert_eq!(tally_only.render_text(MatchStatus::Completed), "Sets 1-0");
    }

    #[test]
    fn test_accessors() {
        let summary = singles_summary();
        assert_eq!(summary.serving_side(), Some(Side::One));
        assert_eq!(summary.display_name(Side::Two), "Sinner");
        assert_eq!(summary.point_label(Side::One), "30");
        assert_eq!(summary.score.set_games(Side::Two), vec![4]);
        assert!(summary.serving_member().is_none());
    }

    #[test]
    fn test_serializes_in_unified_layout() {
        let value = serde_json::to_value(singles_summary()).unwrap();
        assert_eq!(value["participants"]["1"]["info"]["name"], "Alcaraz");
        assert_eq!(value["participants"]["1"]["info"]["type"], "player");
        assert_eq!(value["score"]["points"]["type"], "game");
        assert_eq!(value["score"]["points"]["values"][0], "30");
        assert_eq!(value["meta"]["status"], "in-progress");
        assert_eq!(value["meta"]["format"]["sets"], 3);
        assert_eq!(value["score"]["server"]["current"], "1");
        assert_eq!(value["score"]["winner"], serde_json::Value::Null);
    }

    #[test]
    fn test_terminal_status_and_member_ids() {
        let mut summary = singles_summary();
        assert!(!summary.is_terminal());
        assert!(summary.member_ids().is_empty());
        summary.status = MatchStatus::Retired;
        assert!(summary.is_terminal());
    }
}
