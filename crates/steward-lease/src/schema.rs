//! SQL for the `leader_election` table.
//!
//! One row per lease name. Timestamps are epoch seconds (`BIGINT`) so the
//! row reads the same from every replica regardless of session time zone.

/// Table holding one row per lease.
pub const LEADER_ELECTION_TABLE: &str = "leader_election";

pub const CREATE_LEADER_ELECTION: &str = "CREATE TABLE IF NOT EXISTS leader_election (
    name TEXT PRIMARY KEY,
    holder_identity TEXT NOT NULL,
    lease_duration_seconds INTEGER NOT NULL,
    acquire_time BIGINT NOT NULL,
    renew_time BIGINT NOT NULL,
    leader_transitions INTEGER NOT NULL
)";

pub const SELECT_LEASE: &str = "SELECT name, holder_identity, lease_duration_seconds, \
    acquire_time, renew_time, leader_transitions \
    FROM leader_election WHERE name = $1 LIMIT 1";

pub const INSERT_LEASE: &str = "INSERT INTO leader_election \
    (name, holder_identity, lease_duration_seconds, acquire_time, renew_time, leader_transitions) \
    VALUES ($1, $2, $3, $4, $5, $6)";

pub const UPDATE_LEASE: &str = "UPDATE leader_election SET \
    holder_identity = $2, lease_duration_seconds = $3, acquire_time = $4, \
    renew_time = $5, leader_transitions = $6 \
    WHERE name = $1";
