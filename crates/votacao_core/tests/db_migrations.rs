use rusqlite::Connection;
use votacao_core::db::migrations::latest_version;
use votacao_core::db::{open_db, open_db_in_memory, DbError};
use votacao_core::{RepoError, SqliteAgendaRepository, SqliteVoteRepository};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "agendas");
    assert_table_exists(&conn, "votes");
    assert_index_exists(&conn, "idx_votes_agenda_choice");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("votacao.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "votes");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repositories_reject_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteAgendaRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
    assert!(SqliteVoteRepository::try_new(&conn).is_err());
}

#[test]
fn schema_rejects_votes_with_bad_choice_or_unknown_agenda() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO agendas (title) VALUES ('Pauta');", [])
        .unwrap();

    let bad_choice = conn.execute(
        "INSERT INTO votes (agenda_id, voter_id, choice, cast_at)
         VALUES (1, '12345678901', 'TALVEZ', 0);",
        [],
    );
    assert!(bad_choice.is_err());

    let unknown_agenda = conn.execute(
        "INSERT INTO votes (agenda_id, voter_id, choice, cast_at)
         VALUES (42, '12345678901', 'SIM', 0);",
        [],
    );
    assert!(unknown_agenda.is_err());
}

#[test]
fn schema_rejects_inconsistent_voting_window() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO agendas (title) VALUES ('Pauta');", [])
        .unwrap();

    let partial = conn.execute(
        "UPDATE agendas SET session_opens_at = 1000 WHERE id = 1;",
        [],
    );
    assert!(partial.is_err());

    let zero_duration = conn.execute(
        "UPDATE agendas
         SET session_opens_at = 1000, session_closes_at = 1000, session_duration_minutes = 0
         WHERE id = 1;",
        [],
    );
    assert!(zero_duration.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    assert_schema_object_exists(conn, "table", table_name);
}

fn assert_index_exists(conn: &Connection, index_name: &str) {
    assert_schema_object_exists(conn, "index", index_name);
}

fn assert_schema_object_exists(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}
