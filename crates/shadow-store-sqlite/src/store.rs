//! [`SqliteStore`] — the SQLite implementation of [`ReconStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use shadow_core::{
  TargetId,
  finding::{
    EmailBreach, NewEmailBreach, NewPhoneLookup, NewSourceResult, PhoneLookup,
    SourceResult,
  },
  store::ReconStore,
  target::{NewTarget, Target},
};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{
    RawEmailBreach, RawPhoneLookup, RawSourceResult, RawTarget, encode_dt,
    encode_flag, encode_raw,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A ShadowHunter store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    debug!(path = %path.as_ref().display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ReconStore impl ─────────────────────────────────────────────────────────

impl ReconStore for SqliteStore {
  type Error = Error;

  async fn initialize(&self) -> Result<()> { self.init_schema().await }

  // ── Targets ───────────────────────────────────────────────────────────────

  async fn create_target(&self, input: NewTarget) -> Result<TargetId> {
    let at_str = encode_dt(Utc::now());

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO targets (
             created_at, family_name, given_name, handle,
             email, phone, location, aliases
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            at_str,
            input.family_name,
            input.given_name,
            input.handle,
            input.email,
            input.phone,
            input.location,
            input.aliases,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    debug!(target_id = id, "target created");
    Ok(id)
  }

  async fn fetch_target(&self, id: TargetId) -> Result<Target> {
    let raw: Option<RawTarget> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, created_at, family_name, given_name, handle,
                      email, phone, location, aliases
               FROM targets WHERE id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawTarget {
                  id:          row.get(0)?,
                  created_at:  row.get(1)?,
                  family_name: row.get(2)?,
                  given_name:  row.get(3)?,
                  handle:      row.get(4)?,
                  email:       row.get(5)?,
                  phone:       row.get(6)?,
                  location:    row.get(7)?,
                  aliases:     row.get(8)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.ok_or(Error::TargetNotFound(id))?.into_target()
  }

  // ── Findings — append-only writes ─────────────────────────────────────────

  async fn append_email_breach(&self, input: NewEmailBreach) -> Result<EmailBreach> {
    let found_at = Utc::now();
    let at_str = encode_dt(found_at);
    let raw_str = encode_raw(&input.raw)?;

    let row = input.clone();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO email_breaches (
             target_id, email, breach_name, breach_title,
             breach_date, breach_domain, raw_json, found_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            row.target_id,
            row.email,
            row.breach_name,
            row.breach_title,
            row.breach_date,
            row.breach_domain,
            raw_str,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(EmailBreach {
      id,
      target_id: input.target_id,
      email: input.email,
      breach_name: input.breach_name,
      breach_title: input.breach_title,
      breach_date: input.breach_date,
      breach_domain: input.breach_domain,
      raw: input.raw,
      found_at,
    })
  }

  async fn append_source_result(&self, input: NewSourceResult) -> Result<SourceResult> {
    let found_at = Utc::now();
    let at_str = encode_dt(found_at);
    let raw_str = encode_raw(&input.raw)?;

    let row = input.clone();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO source_results (
             target_id, source, type, url, score, summary, raw_json, found_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            row.target_id,
            row.source,
            row.result_type,
            row.url,
            row.score,
            row.summary,
            raw_str,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(SourceResult {
      id,
      target_id: input.target_id,
      source: input.source,
      result_type: input.result_type,
      url: input.url,
      score: input.score,
      summary: input.summary,
      raw: input.raw,
      found_at,
    })
  }

  async fn append_phone_lookup(&self, input: NewPhoneLookup) -> Result<PhoneLookup> {
    let found_at = Utc::now();
    let at_str = encode_dt(found_at);
    let raw_str = encode_raw(&input.raw)?;

    let row = input.clone();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO phone_lookups (
             target_id, number, e164, country, carrier,
             is_valid, is_possible, raw_json, found_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            row.target_id,
            row.number,
            row.e164,
            row.country,
            row.carrier,
            encode_flag(row.is_valid),
            encode_flag(row.is_possible),
            raw_str,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(PhoneLookup {
      id,
      target_id: input.target_id,
      number: input.number,
      e164: input.e164,
      country: input.country,
      carrier: input.carrier,
      is_valid: input.is_valid,
      is_possible: input.is_possible,
      raw: input.raw,
      found_at,
    })
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn fetch_email_breaches(&self, target_id: TargetId) -> Result<Vec<EmailBreach>> {
    let raws: Vec<RawEmailBreach> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, target_id, email, breach_name, breach_title,
                  breach_date, breach_domain, raw_json, found_at
           FROM email_breaches
           WHERE target_id = ?1
           ORDER BY id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![target_id], |row| {
            Ok(RawEmailBreach {
              id:            row.get(0)?,
              target_id:     row.get(1)?,
              email:         row.get(2)?,
              breach_name:   row.get(3)?,
              breach_title:  row.get(4)?,
              breach_date:   row.get(5)?,
              breach_domain: row.get(6)?,
              raw_json:      row.get(7)?,
              found_at:      row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEmailBreach::into_breach).collect()
  }

  async fn fetch_source_results(&self, target_id: TargetId) -> Result<Vec<SourceResult>> {
    let raws: Vec<RawSourceResult> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, target_id, source, type, url, score, summary, raw_json, found_at
           FROM source_results
           WHERE target_id = ?1
           ORDER BY id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![target_id], |row| {
            Ok(RawSourceResult {
              id:          row.get(0)?,
              target_id:   row.get(1)?,
              source:      row.get(2)?,
              result_type: row.get(3)?,
              url:         row.get(4)?,
              score:       row.get(5)?,
              summary:     row.get(6)?,
              raw_json:    row.get(7)?,
              found_at:    row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawSourceResult::into_source_result)
      .collect()
  }

  async fn fetch_phone_lookups(&self, target_id: TargetId) -> Result<Vec<PhoneLookup>> {
    let raws: Vec<RawPhoneLookup> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, target_id, number, e164, country, carrier,
                  is_valid, is_possible, raw_json, found_at
           FROM phone_lookups
           WHERE target_id = ?1
           ORDER BY id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![target_id], |row| {
            Ok(RawPhoneLookup {
              id:          row.get(0)?,
              target_id:   row.get(1)?,
              number:      row.get(2)?,
              e164:        row.get(3)?,
              country:     row.get(4)?,
              carrier:     row.get(5)?,
              is_valid:    row.get(6)?,
              is_possible: row.get(7)?,
              raw_json:    row.get(8)?,
              found_at:    row.get(9)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawPhoneLookup::into_phone_lookup)
      .collect()
  }
}
