//! PostgreSQL store implementation.
//!
//! Schema: `tournaments`, `brackets` (one live row per tournament, seeding
//! held as a JSON column), and `matches` (advancement destinations held as
//! JSON columns). The atomic operations run inside transactions.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use std::sync::Arc;

use super::EngineStore;
use crate::bracket::{
    Bracket, BracketSegment, CompletionKind, Destination, Match, MatchId, MatchStatus,
};
use crate::errors::{EngineError, EngineResult};
use crate::seeding::SeedAssignment;
use crate::tournament::{Tournament, TournamentFormat, TournamentId, TournamentStatus};

/// sqlx-backed store over a shared connection pool.
#[derive(Clone)]
pub struct PgEngineStore {
    pool: Arc<PgPool>,
}

impl PgEngineStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn format_str(format: TournamentFormat) -> &'static str {
    match format {
        TournamentFormat::SingleElimination => "single_elimination",
        TournamentFormat::DoubleElimination => "double_elimination",
    }
}

fn parse_format(s: &str) -> TournamentFormat {
    match s {
        "double_elimination" => TournamentFormat::DoubleElimination,
        _ => TournamentFormat::SingleElimination,
    }
}

fn status_str(status: TournamentStatus) -> &'static str {
    match status {
        TournamentStatus::Draft => "draft",
        TournamentStatus::RegistrationOpen => "registration_open",
        TournamentStatus::RegistrationClosed => "registration_closed",
        TournamentStatus::InProgress => "in_progress",
        TournamentStatus::Completed => "completed",
    }
}

fn parse_status(s: &str) -> TournamentStatus {
    match s {
        "registration_open" => TournamentStatus::RegistrationOpen,
        "registration_closed" => TournamentStatus::RegistrationClosed,
        "in_progress" => TournamentStatus::InProgress,
        "completed" => TournamentStatus::Completed,
        _ => TournamentStatus::Draft,
    }
}

fn match_status_str(status: MatchStatus) -> &'static str {
    match status {
        MatchStatus::Scheduled => "scheduled",
        MatchStatus::InProgress => "in_progress",
        MatchStatus::Completed => "completed",
        MatchStatus::Cancelled => "cancelled",
    }
}

fn parse_match_status(s: &str) -> MatchStatus {
    match s {
        "in_progress" => MatchStatus::InProgress,
        "completed" => MatchStatus::Completed,
        "cancelled" => MatchStatus::Cancelled,
        _ => MatchStatus::Scheduled,
    }
}

fn segment_str(segment: BracketSegment) -> &'static str {
    match segment {
        BracketSegment::Winners => "winners",
        BracketSegment::Losers => "losers",
        BracketSegment::Semifinals => "semifinals",
        BracketSegment::Finals => "finals",
        BracketSegment::ThirdPlace => "third_place",
    }
}

fn parse_segment(s: &str) -> BracketSegment {
    match s {
        "losers" => BracketSegment::Losers,
        "semifinals" => BracketSegment::Semifinals,
        "finals" => BracketSegment::Finals,
        "third_place" => BracketSegment::ThirdPlace,
        _ => BracketSegment::Winners,
    }
}

fn completion_str(completion: Option<CompletionKind>) -> Option<&'static str> {
    completion.map(|c| match c {
        CompletionKind::Normal => "normal",
        CompletionKind::Emergency => "emergency",
    })
}

fn parse_completion(s: Option<String>) -> Option<CompletionKind> {
    s.map(|s| match s.as_str() {
        "emergency" => CompletionKind::Emergency,
        _ => CompletionKind::Normal,
    })
}

fn match_from_row(row: &PgRow) -> EngineResult<Match> {
    let status: String = row.get("status");
    let segment: String = row.get("segment");
    let completion: Option<String> = row.get("completion");
    let winner_to: Option<serde_json::Value> = row.get("winner_to");
    let loser_to: Option<serde_json::Value> = row.get("loser_to");

    Ok(Match {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        round_number: row.get("round_number"),
        segment: parse_segment(&segment),
        slot_number: row.get("slot_number"),
        player_a: row.get("player_a"),
        player_b: row.get("player_b"),
        score_a: row.get("score_a"),
        score_b: row.get("score_b"),
        status: parse_match_status(&status),
        winner_id: row.get("winner_id"),
        completion: parse_completion(completion),
        requires_review: row.get("requires_review"),
        winner_to: winner_to
            .map(serde_json::from_value::<Destination>)
            .transpose()?,
        loser_to: loser_to
            .map(serde_json::from_value::<Destination>)
            .transpose()?,
        scheduled_at: row.get("scheduled_at"),
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
    })
}

async fn insert_bracket_tx(
    tx: &mut Transaction<'_, Postgres>,
    bracket: &Bracket,
) -> EngineResult<()> {
    let seeding = serde_json::to_value(&bracket.seeding)?;

    sqlx::query(
        r#"
        INSERT INTO brackets (id, tournament_id, format, seeding, total_rounds, total_matches, generated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(bracket.id)
    .bind(bracket.tournament_id)
    .bind(format_str(bracket.format))
    .bind(seeding)
    .bind(bracket.total_rounds as i32)
    .bind(bracket.total_matches as i32)
    .bind(bracket.generated_at)
    .execute(&mut **tx)
    .await?;

    for m in &bracket.matches {
        sqlx::query(
            r#"
            INSERT INTO matches (id, bracket_id, tournament_id, round_number, segment, slot_number,
                                 player_a, player_b, score_a, score_b, status, winner_id,
                                 completion, requires_review, winner_to, loser_to,
                                 scheduled_at, started_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(m.id)
        .bind(bracket.id)
        .bind(m.tournament_id)
        .bind(m.round_number)
        .bind(segment_str(m.segment))
        .bind(m.slot_number)
        .bind(m.player_a)
        .bind(m.player_b)
        .bind(m.score_a)
        .bind(m.score_b)
        .bind(match_status_str(m.status))
        .bind(m.winner_id)
        .bind(completion_str(m.completion))
        .bind(m.requires_review)
        .bind(m.winner_to.map(serde_json::to_value).transpose()?)
        .bind(m.loser_to.map(serde_json::to_value).transpose()?)
        .bind(m.scheduled_at)
        .bind(m.started_at)
        .bind(m.completed_at)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[async_trait]
impl EngineStore for PgEngineStore {
    async fn tournament(&self, id: TournamentId) -> EngineResult<Tournament> {
        let row = sqlx::query(
            "SELECT id, name, format, capacity, prize_pool, status, created_at FROM tournaments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(EngineError::TournamentNotFound(id))?;

        let format: String = row.get("format");
        let status: String = row.get("status");
        let capacity: i32 = row.get("capacity");

        Ok(Tournament {
            id: row.get("id"),
            name: row.get("name"),
            format: parse_format(&format),
            capacity: capacity as usize,
            prize_pool: row.get("prize_pool"),
            status: parse_status(&status),
            created_at: row.get("created_at"),
        })
    }

    async fn update_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> EngineResult<()> {
        let result = sqlx::query("UPDATE tournaments SET status = $1 WHERE id = $2")
            .bind(status_str(status))
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        if result.rows_affected() == 0 {
            return Err(EngineError::TournamentNotFound(id));
        }
        Ok(())
    }

    async fn bracket(&self, tournament_id: TournamentId) -> EngineResult<Option<Bracket>> {
        let Some(row) = sqlx::query(
            r#"
            SELECT id, tournament_id, format, seeding, total_rounds, total_matches, generated_at
            FROM brackets
            WHERE tournament_id = $1
            "#,
        )
        .bind(tournament_id)
        .fetch_optional(self.pool.as_ref())
        .await?
        else {
            return Ok(None);
        };

        let format: String = row.get("format");
        let seeding: SeedAssignment = serde_json::from_value(row.get("seeding"))?;
        let total_rounds: i32 = row.get("total_rounds");
        let total_matches: i32 = row.get("total_matches");

        let match_rows = sqlx::query(
            r#"
            SELECT id, tournament_id, round_number, segment, slot_number, player_a, player_b,
                   score_a, score_b, status, winner_id, completion, requires_review,
                   winner_to, loser_to, scheduled_at, started_at, completed_at
            FROM matches
            WHERE tournament_id = $1
            ORDER BY round_number, slot_number
            "#,
        )
        .bind(tournament_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        let matches = match_rows
            .iter()
            .map(match_from_row)
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(Some(Bracket {
            id: row.get("id"),
            tournament_id: row.get("tournament_id"),
            format: parse_format(&format),
            seeding,
            matches,
            total_rounds: total_rounds as u32,
            total_matches: total_matches as usize,
            generated_at: row.get("generated_at"),
        }))
    }

    async fn insert_bracket(&self, bracket: &Bracket) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id FROM brackets WHERE tournament_id = $1 FOR UPDATE")
            .bind(bracket.tournament_id)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(EngineError::BracketAlreadyExists(bracket.tournament_id));
        }

        insert_bracket_tx(&mut tx, bracket).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace_bracket(&self, bracket: &Bracket) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM matches WHERE tournament_id = $1")
            .bind(bracket.tournament_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM brackets WHERE tournament_id = $1")
            .bind(bracket.tournament_id)
            .execute(&mut *tx)
            .await?;

        insert_bracket_tx(&mut tx, bracket).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_match(&self, id: MatchId) -> EngineResult<Match> {
        let row = sqlx::query(
            r#"
            SELECT id, tournament_id, round_number, segment, slot_number, player_a, player_b,
                   score_a, score_b, status, winner_id, completion, requires_review,
                   winner_to, loser_to, scheduled_at, started_at, completed_at
            FROM matches
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(EngineError::MatchNotFound(id))?;

        match_from_row(&row)
    }

    async fn update_matches(
        &self,
        tournament_id: TournamentId,
        matches: &[Match],
    ) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        for m in matches {
            let result = sqlx::query(
                r#"
                UPDATE matches
                SET player_a = $1, player_b = $2, score_a = $3, score_b = $4, status = $5,
                    winner_id = $6, completion = $7, requires_review = $8,
                    started_at = $9, completed_at = $10
                WHERE id = $11 AND tournament_id = $12
                "#,
            )
            .bind(m.player_a)
            .bind(m.player_b)
            .bind(m.score_a)
            .bind(m.score_b)
            .bind(match_status_str(m.status))
            .bind(m.winner_id)
            .bind(completion_str(m.completion))
            .bind(m.requires_review)
            .bind(m.started_at)
            .bind(m.completed_at)
            .bind(m.id)
            .bind(tournament_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(EngineError::MatchNotFound(m.id));
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
