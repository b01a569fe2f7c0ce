//! Read-only views of the live schema, used to verify what `setup` and
//! `cleanup` actually left behind.

use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool, Integer, Text};
use diesel::sqlite::SqliteConnection;

use crate::db::MIGRATIONS_TABLE;
use crate::error::Result;

#[derive(QueryableByName, Debug)]
struct TableName {
    #[diesel(sql_type = Text)]
    name: String,
}

#[derive(QueryableByName, Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = Text)]
    pub column_type: String,
    #[diesel(sql_type = Bool)]
    pub not_null: bool,
    #[diesel(sql_type = Bool)]
    pub primary_key: bool,
}

#[derive(QueryableByName, Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyInfo {
    #[diesel(sql_type = Text)]
    pub column: String,
    #[diesel(sql_type = Text)]
    pub referenced_table: String,
    #[diesel(sql_type = Text)]
    pub referenced_column: String,
    #[diesel(sql_type = Text)]
    pub on_delete: String,
}

#[derive(QueryableByName, Debug)]
struct TableCount {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

#[derive(QueryableByName, Debug)]
struct ForeignKeysPragma {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}

/// Application tables, sorted by name.
pub fn list_tables(conn: &mut SqliteConnection) -> Result<Vec<String>> {
    let rows = diesel::sql_query(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name <> ? \
         ORDER BY name",
    )
    .bind::<Text, _>(MIGRATIONS_TABLE)
    .load::<TableName>(conn)?;
    Ok(rows.into_iter().map(|row| row.name).collect())
}

/// Unlike [`list_tables`], this also sees the migration bookkeeping table.
pub fn table_exists(conn: &mut SqliteConnection, table: &str) -> Result<bool> {
    let row = diesel::sql_query(
        "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?",
    )
    .bind::<Text, _>(table)
    .get_result::<TableCount>(conn)?;
    Ok(row.count > 0)
}

/// Columns of `table` in declaration order. Empty if the table does not exist.
pub fn table_columns(conn: &mut SqliteConnection, table: &str) -> Result<Vec<ColumnInfo>> {
    diesel::sql_query(
        "SELECT name, type AS column_type, \"notnull\" <> 0 AS not_null, pk <> 0 AS primary_key \
         FROM pragma_table_info(?) ORDER BY cid",
    )
    .bind::<Text, _>(table)
    .load::<ColumnInfo>(conn)
    .map_err(Into::into)
}

pub fn table_foreign_keys(conn: &mut SqliteConnection, table: &str) -> Result<Vec<ForeignKeyInfo>> {
    diesel::sql_query(
        "SELECT \"from\" AS \"column\", \"table\" AS referenced_table, \
         \"to\" AS referenced_column, on_delete \
         FROM pragma_foreign_key_list(?) ORDER BY id, seq",
    )
    .bind::<Text, _>(table)
    .load::<ForeignKeyInfo>(conn)
    .map_err(Into::into)
}

pub fn foreign_keys_enabled(conn: &mut SqliteConnection) -> Result<bool> {
    let row = diesel::sql_query("PRAGMA foreign_keys").get_result::<ForeignKeysPragma>(conn)?;
    Ok(row.foreign_keys != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_store;

    #[test]
    fn user_id_is_the_primary_key() -> anyhow::Result<()> {
        let (_dir, store) = test_store();
        let mut conn = store.conn()?;

        let columns = table_columns(&mut conn, "user")?;
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "first_name", "last_name"]);
        assert!(columns[0].primary_key);
        assert_eq!(columns[1].column_type, "VARCHAR(50)");
        Ok(())
    }

    #[test]
    fn set_weight_is_a_real_column() -> anyhow::Result<()> {
        let (_dir, store) = test_store();
        let mut conn = store.conn()?;

        let columns = table_columns(&mut conn, "set")?;
        let weight = columns.iter().find(|c| c.name == "weight").unwrap();
        assert_eq!(weight.column_type, "DOUBLE");
        let reps = columns.iter().find(|c| c.name == "repetitions").unwrap();
        assert_eq!(reps.column_type, "INTEGER");
        Ok(())
    }

    #[test]
    fn link_tables_use_composite_keys() -> anyhow::Result<()> {
        let (_dir, store) = test_store();
        let mut conn = store.conn()?;

        for table in ["user_workout", "workout_set", "exercise_muscle", "exercise_set"] {
            let columns = table_columns(&mut conn, table)?;
            assert_eq!(columns.len(), 2, "{table}");
            assert!(columns.iter().all(|c| c.primary_key && c.not_null), "{table}");

            let fks = table_foreign_keys(&mut conn, table)?;
            assert_eq!(fks.len(), 2, "{table}");
            assert!(fks.iter().all(|fk| fk.on_delete == "CASCADE"), "{table}");
        }
        Ok(())
    }

    #[test]
    fn plan_is_isolated() -> anyhow::Result<()> {
        let (_dir, store) = test_store();
        let mut conn = store.conn()?;

        assert!(table_foreign_keys(&mut conn, "plan")?.is_empty());
        for table in list_tables(&mut conn)? {
            let fks = table_foreign_keys(&mut conn, &table)?;
            assert!(fks.iter().all(|fk| fk.referenced_table != "plan"), "{table}");
        }
        Ok(())
    }

    #[test]
    fn table_exists_sees_bookkeeping() -> anyhow::Result<()> {
        let (_dir, store) = test_store();
        let mut conn = store.conn()?;

        assert!(table_exists(&mut conn, "set")?);
        assert!(table_exists(&mut conn, MIGRATIONS_TABLE)?);
        assert!(!table_exists(&mut conn, "routine")?);
        Ok(())
    }

    #[test]
    fn missing_table_has_no_columns() -> anyhow::Result<()> {
        let (_dir, store) = test_store();
        let mut conn = store.conn()?;

        assert!(table_columns(&mut conn, "routine")?.is_empty());
        Ok(())
    }
}
