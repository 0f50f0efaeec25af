use super::*;
use crate::drivers::RecordingDriver;
use crate::overlay::SoftDelete;
use crate::schema::{self, DatabaseSchema, TableSchema};
use crate::Database;

fn users_schema() -> DatabaseSchema {
    DatabaseSchema::new()
        .table(
            "users",
            TableSchema::new()
                .column("id", schema::int().primary_key())
                .column("name", schema::text())
                .column("age", schema::int().nullable())
                .column("deleted_at", schema::timestamp().nullable()),
        )
        .table(
            "orders",
            TableSchema::new()
                .column("id", schema::int().primary_key())
                .column("userId", schema::int())
                .column("status", schema::text()),
        )
}

fn db() -> (Database, RecordingDriver) {
    let driver = RecordingDriver::new();
    let handle = Database::new(users_schema(), std::sync::Arc::new(driver.clone())).unwrap();
    (handle, driver)
}

fn db_with_overlay() -> (Database, RecordingDriver) {
    let (handle, driver) = db();
    (
        handle.with_soft_delete(SoftDelete::new().table("users")),
        driver,
    )
}

/// Collect `$N` indices in textual order.
fn placeholders(sql: &str) -> Vec<usize> {
    let mut out = Vec::new();
    let mut chars = sql.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '$' {
            continue;
        }
        let mut digits = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_ascii_digit() {
                digits.push(next);
                chars.next();
            } else {
                break;
            }
        }
        if let Ok(n) = digits.parse() {
            out.push(n);
        }
    }
    out
}

/// Placeholder indices must be exactly 1..=len(params), in textual order.
fn assert_param_safety(sql: &str, params: &[Value]) {
    let indices = placeholders(sql);
    let expected: Vec<usize> = (1..=params.len()).collect();
    assert_eq!(indices, expected, "in: {sql}");
}

#[test]
fn select_with_filter_order_and_limit() {
    let (sql, params) = QueryBuilder::table("users")
        .where_(Filter::new().eq("id", 1).field("age", Cond::gt(18)))
        .order_by("name", SortDir::Asc)
        .limit(5)
        .build()
        .unwrap();
    assert_eq!(
        sql,
        r#"SELECT * FROM "users" WHERE "id" = $1 AND "age" > $2 ORDER BY "name" ASC LIMIT 5"#
    );
    assert_eq!(params, vec![Value::Int(1), Value::Int(18)]);
    assert_param_safety(&sql, &params);
}

#[test]
fn or_where_with_between() {
    let (sql, params) = QueryBuilder::table("users")
        .where_(Filter::new().eq("name", "Alice"))
        .or_where(Filter::new().between("age", 20, 30))
        .build()
        .unwrap();
    assert!(
        sql.ends_with(r#"WHERE "name" = $1 OR "age" BETWEEN $2 AND $3"#),
        "got: {sql}"
    );
    assert_eq!(
        params,
        vec![Value::Text("Alice".into()), Value::Int(20), Value::Int(30)]
    );
}

#[test]
fn subquery_in_where_rebases_params() {
    let inner = QueryBuilder::table("orders")
        .select(&["userId"])
        .where_(Filter::new().eq("status", "completed"));
    let (sql, params) = QueryBuilder::table("users")
        .where_(Filter::new().subquery("id", inner))
        .build()
        .unwrap();
    assert_eq!(
        sql,
        r#"SELECT * FROM "users" WHERE "id" IN (SELECT "userId" FROM "orders" WHERE "status" = $1)"#
    );
    assert_eq!(params, vec![Value::Text("completed".into())]);
}

#[test]
fn subquery_after_outer_params_is_shifted() {
    let inner = QueryBuilder::table("orders")
        .select(&["userId"])
        .where_(Filter::new().eq("status", "completed").gt("total", 100));
    let (sql, params) = QueryBuilder::table("users")
        .where_(Filter::new().eq("active", true).subquery("id", inner))
        .build()
        .unwrap();
    assert!(
        sql.contains(r#""status" = $2 AND "total" > $3"#),
        "got: {sql}"
    );
    assert_eq!(params.len(), 3);
    assert_param_safety(&sql, &params);
}

#[test]
fn deeply_nested_subqueries_stay_contiguous() {
    let level3 = QueryBuilder::table("c")
        .select(&["id"])
        .where_(Filter::new().eq("x", 1));
    let level2 = QueryBuilder::table("b")
        .select(&["id"])
        .where_(Filter::new().eq("y", 2).subquery("id", level3));
    let (sql, params) = QueryBuilder::table("a")
        .where_(Filter::new().eq("z", 3).subquery("id", level2))
        .build()
        .unwrap();
    assert_eq!(params, vec![Value::Int(3), Value::Int(2), Value::Int(1)]);
    assert_param_safety(&sql, &params);
}

#[test]
fn upsert_with_do_update() {
    let (sql, params) = QueryBuilder::table("users")
        .insert(Record::new().set("id", 1).set("name", "A"))
        .on_conflict(&["id"])
        .do_update(Record::new().set("name", "A2"))
        .build()
        .unwrap();
    assert_eq!(
        sql,
        r#"INSERT INTO "users" ("id", "name") VALUES ($1, $2) ON CONFLICT ("id") DO UPDATE SET "name" = $3 RETURNING *"#
    );
    assert_eq!(
        params,
        vec![Value::Int(1), Value::Text("A".into()), Value::Text("A2".into())]
    );
}

#[test]
fn on_conflict_do_nothing() {
    let sql = QueryBuilder::table("users")
        .insert(Record::new().set("id", 1))
        .on_conflict(&["id"])
        .do_nothing()
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        r#"INSERT INTO "users" ("id") VALUES ($1) ON CONFLICT ("id") DO NOTHING RETURNING *"#
    );
}

#[test]
fn on_conflict_requires_insert() {
    let err = QueryBuilder::table("users")
        .update(Record::new().set("name", "x"))
        .on_conflict(&["id"])
        .do_nothing()
        .build()
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn on_conflict_do_update_requires_assignments() {
    let err = QueryBuilder::table("users")
        .insert(Record::new().set("id", 1))
        .on_conflict(&["id"])
        .do_update(Record::new())
        .build()
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn insert_batch_is_row_major() {
    let (sql, params) = QueryBuilder::table("users")
        .insert_many(vec![
            Record::new().set("id", 1).set("name", "A"),
            Record::new().set("name", "B").set("id", 2),
        ])
        .returning_none()
        .build()
        .unwrap();
    assert_eq!(
        sql,
        r#"INSERT INTO "users" ("id", "name") VALUES ($1, $2), ($3, $4)"#
    );
    assert_eq!(
        params,
        vec![
            Value::Int(1),
            Value::Text("A".into()),
            Value::Int(2),
            Value::Text("B".into())
        ]
    );
}

#[test]
fn insert_batch_missing_column_fails() {
    let err = QueryBuilder::table("users")
        .insert_many(vec![
            Record::new().set("id", 1).set("name", "A"),
            Record::new().set("id", 2),
        ])
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("missing column 'name'"));
}

#[test]
fn empty_insert_fails() {
    assert!(QueryBuilder::table("users")
        .insert_many(vec![])
        .build()
        .is_err());
    assert!(QueryBuilder::table("users")
        .insert(Record::new())
        .build()
        .is_err());
}

#[test]
fn update_renders_assignments_then_where() {
    let (sql, params) = QueryBuilder::table("users")
        .update(Record::new().set("name", "Z").set("age", 40))
        .where_(Filter::new().eq("id", 7))
        .returning(&["id", "name"])
        .build()
        .unwrap();
    assert_eq!(
        sql,
        r#"UPDATE "users" SET "name" = $1, "age" = $2 WHERE "id" = $3 RETURNING "id", "name""#
    );
    assert_eq!(params.len(), 3);
}

#[test]
fn update_requires_assignments() {
    assert!(QueryBuilder::table("users")
        .update(Record::new())
        .build()
        .is_err());
}

#[test]
fn delete_renders_where_and_default_returning() {
    let (sql, params) = QueryBuilder::table("users")
        .delete()
        .where_(Filter::new().eq("id", 1))
        .build()
        .unwrap();
    assert_eq!(sql, r#"DELETE FROM "users" WHERE "id" = $1 RETURNING *"#);
    assert_eq!(params, vec![Value::Int(1)]);
}

#[test]
fn mutations_reject_joins() {
    for qb in [
        QueryBuilder::table("users")
            .insert(Record::new().set("id", 1))
            .inner_join("orders", "users.id", "=", "orders.userId"),
        QueryBuilder::table("users")
            .update(Record::new().set("name", "x"))
            .left_join("orders", "users.id", "=", "orders.userId"),
        QueryBuilder::table("users")
            .delete()
            .right_join("orders", "users.id", "=", "orders.userId"),
    ] {
        assert!(qb.build().unwrap_err().is_configuration());
    }
}

#[test]
fn two_operations_are_rejected() {
    let err = QueryBuilder::table("users")
        .select(&[])
        .delete()
        .build()
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("operation already set"));
}

#[test]
fn joins_render_with_qualified_quoting() {
    let sql = QueryBuilder::table("users")
        .inner_join("orders", "users.id", "=", "orders.userId")
        .full_join("audits", "users.id", "=", "audits.userId")
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        r#"SELECT * FROM "users" INNER JOIN "orders" ON "users"."id" = "orders"."userId" FULL OUTER JOIN "audits" ON "users"."id" = "audits"."userId""#
    );
}

#[test]
fn projection_quoting_rules() {
    let sql = QueryBuilder::table("users")
        .select(&["id", "users.name", "COUNT(*) AS total", "*"])
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        r#"SELECT "id", "users"."name", COUNT(*) AS total, * FROM "users""#
    );
}

#[test]
fn group_by_and_having_rebase() {
    let (sql, params) = QueryBuilder::table("orders")
        .select(&["userId", "COUNT(*) AS n"])
        .where_(Filter::new().eq("status", "open"))
        .group_by(&["userId"])
        .having("COUNT(*) > $1", vec![Value::Int(5)])
        .having("SUM(total) > $1", vec![Value::Int(100)])
        .build()
        .unwrap();
    assert!(
        sql.contains(r#"GROUP BY "userId" HAVING COUNT(*) > $2 AND SUM(total) > $3"#),
        "got: {sql}"
    );
    assert_eq!(params.len(), 3);
    assert_param_safety(&sql, &params);
}

#[test]
fn empty_in_renders_constant_false() {
    let sql = QueryBuilder::table("users")
        .where_(Filter::new().in_list("id", Vec::<i64>::new()))
        .to_sql()
        .unwrap();
    assert!(sql.ends_with("WHERE 1=0"));

    let sql = QueryBuilder::table("users")
        .where_(Filter::new().not_in("id", Vec::<i64>::new()))
        .to_sql()
        .unwrap();
    assert!(sql.ends_with("WHERE 1=1"));
}

#[test]
fn in_list_numbers_each_element() {
    let (sql, params) = QueryBuilder::table("users")
        .where_(Filter::new().in_list("id", [1i64, 2, 3]))
        .build()
        .unwrap();
    assert!(sql.ends_with(r#""id" IN ($1, $2, $3)"#));
    assert_eq!(params.len(), 3);
}

#[test]
fn null_scalar_desugars_to_is_null() {
    let (sql, params) = QueryBuilder::table("users")
        .where_(Filter::new().field("deleted_at", Value::Null))
        .build()
        .unwrap();
    assert!(sql.ends_with(r#""deleted_at" IS NULL"#));
    assert!(params.is_empty());
}

#[test]
fn multi_operator_object_expands_in_order() {
    let filter = Filter::from_json(&serde_json::json!({
        "age": {"gte": 18, "lt": 65},
        "name": {"like": "A%"},
    }))
    .unwrap();
    let (sql, params) = QueryBuilder::table("users").where_(filter).build().unwrap();
    assert!(
        sql.ends_with(r#""age" >= $1 AND "age" < $2 AND "name" LIKE $3"#),
        "got: {sql}"
    );
    assert_eq!(params[0], Value::Int(18));
    assert_eq!(params[1], Value::Int(65));
}

#[test]
fn json_filter_preserves_author_order() {
    let filter = Filter::from_json(&serde_json::json!({
        "id": 1,
        "age": {"gt": 18},
    }))
    .unwrap();
    let (sql, params) = QueryBuilder::table("users").where_(filter).build().unwrap();
    assert!(sql.ends_with(r#""id" = $1 AND "age" > $2"#), "got: {sql}");
    assert_eq!(params, vec![Value::Int(1), Value::Int(18)]);
}

#[test]
fn json_filter_rejects_bad_shapes() {
    assert!(Filter::from_json(&serde_json::json!(["not", "an", "object"])).is_err());
    assert!(Filter::from_json(&serde_json::json!({"id": [1, 2]})).is_err());
    assert!(Filter::from_json(&serde_json::json!({"age": {"between": [1]}})).is_err());
    assert!(Filter::from_json(&serde_json::json!({"age": {"between": [1, 2, 3]}})).is_err());
    assert!(Filter::from_json(&serde_json::json!({"age": {"wat": 1}})).is_err());
    assert!(Filter::from_json(&serde_json::json!({"name": {"like": 7}})).is_err());
}

#[test]
fn json_filter_full_table() {
    let filter = Filter::from_json(&serde_json::json!({
        "a": null,
        "b": {"in": [1, 2]},
        "c": {"notIn": []},
        "d": {"ilike": "%x%"},
        "e": {"not": 9},
        "f": {"between": [1, 2]},
    }))
    .unwrap();
    let (sql, params) = QueryBuilder::table("t").where_(filter).build().unwrap();
    assert!(sql.contains(r#""a" IS NULL"#));
    assert!(sql.contains(r#""b" IN ($1, $2)"#));
    assert!(sql.contains("1=1"));
    assert!(sql.contains(r#""d" ILIKE $3"#));
    assert!(sql.contains(r#""e" != $4"#));
    assert!(sql.contains(r#""f" BETWEEN $5 AND $6"#));
    assert_param_safety(&sql, &params);
}

#[test]
fn subquery_as_source() {
    let inner = QueryBuilder::table("orders")
        .select(&["userId"])
        .where_(Filter::new().eq("status", "completed"));
    let (sql, params) = QueryBuilder::from_subquery(inner, "completed_orders")
        .where_(Filter::new().gt("userId", 10))
        .build()
        .unwrap();
    assert_eq!(
        sql,
        r#"SELECT * FROM (SELECT "userId" FROM "orders" WHERE "status" = $1) AS "completed_orders" WHERE "userId" > $2"#
    );
    assert_eq!(params.len(), 2);
    assert_param_safety(&sql, &params);
}

// ==================== soft-delete overlay ====================

#[test]
fn covered_select_gets_is_null_predicate() {
    let (handle, _) = db_with_overlay();
    let (sql, _) = handle
        .query("users")
        .where_(Filter::new().eq("id", 1))
        .build()
        .unwrap();
    assert_eq!(
        sql,
        r#"SELECT * FROM "users" WHERE "id" = $1 AND "deleted_at" IS NULL"#
    );
}

#[test]
fn uncovered_table_is_untouched() {
    let (handle, _) = db_with_overlay();
    let sql = handle.query("orders").to_sql().unwrap();
    assert_eq!(sql, r#"SELECT * FROM "orders""#);
}

#[test]
fn with_trashed_suppresses_injection() {
    let (handle, _) = db_with_overlay();
    let sql = handle.query("users").with_trashed().to_sql().unwrap();
    assert_eq!(sql, r#"SELECT * FROM "users""#);
}

#[test]
fn only_trashed_inverts_the_predicate() {
    let (handle, _) = db_with_overlay();
    let sql = handle.query("users").only_trashed().to_sql().unwrap();
    assert_eq!(sql, r#"SELECT * FROM "users" WHERE "deleted_at" IS NOT NULL"#);
}

#[test]
fn covered_update_gets_is_null_predicate() {
    let (handle, _) = db_with_overlay();
    let (sql, _) = handle
        .query("users")
        .update(Record::new().set("name", "x"))
        .where_(Filter::new().eq("id", 1))
        .build()
        .unwrap();
    assert!(
        sql.contains(r#"WHERE "id" = $2 AND "deleted_at" IS NULL"#),
        "got: {sql}"
    );
}

#[test]
fn count_honours_the_overlay() {
    let (handle, _) = db_with_overlay();
    let (sql, _) = handle
        .query("users")
        .where_(Filter::new().eq("age", 30))
        .build_count()
        .unwrap();
    assert_eq!(
        sql,
        r#"SELECT COUNT(*) FROM "users" WHERE "age" = $1 AND "deleted_at" IS NULL"#
    );
}

#[test]
fn hard_delete_ignores_the_overlay() {
    let (handle, _) = db_with_overlay();
    let sql = handle
        .query("users")
        .delete()
        .where_(Filter::new().eq("id", 1))
        .to_sql()
        .unwrap();
    assert_eq!(sql, r#"DELETE FROM "users" WHERE "id" = $1 RETURNING *"#);
}

#[tokio::test]
async fn first_appends_limit_one_with_overlay() {
    let (handle, driver) = db_with_overlay();
    let row = handle
        .query("users")
        .where_(Filter::new().eq("id", 1))
        .first()
        .await
        .unwrap();
    assert!(row.is_none());
    assert_eq!(
        driver.statements(),
        vec![r#"SELECT * FROM "users" WHERE "id" = $1 AND "deleted_at" IS NULL LIMIT 1"#]
    );
}

#[tokio::test]
async fn soft_delete_stamps_and_guards() {
    let (handle, driver) = db_with_overlay();
    handle
        .query("users")
        .where_(Filter::new().eq("id", 1))
        .soft_delete()
        .await
        .unwrap();
    let call = &driver.calls()[0];
    assert!(
        call.sql
            .starts_with(r#"UPDATE "users" SET "deleted_at" = $1 WHERE "id" = $2 AND "deleted_at" IS NULL"#),
        "got: {}",
        call.sql
    );
    assert!(matches!(call.params[0], Value::Timestamp(_)));
}

#[tokio::test]
async fn restore_clears_the_stamp() {
    let (handle, driver) = db_with_overlay();
    handle
        .query("users")
        .where_(Filter::new().eq("id", 1))
        .restore()
        .await
        .unwrap();
    let call = &driver.calls()[0];
    assert!(
        call.sql
            .starts_with(r#"UPDATE "users" SET "deleted_at" = $1 WHERE "id" = $2 AND "deleted_at" IS NOT NULL"#),
        "got: {}",
        call.sql
    );
    assert!(call.params[0].is_null());
}

#[tokio::test]
async fn soft_delete_requires_coverage() {
    let (handle, _) = db_with_overlay();
    let err = handle.query("orders").soft_delete().await.unwrap_err();
    assert!(err.is_configuration());

    let (plain, _) = db();
    assert!(plain.query("users").restore().await.is_err());
}

// ==================== terminals ====================

#[tokio::test]
async fn count_coerces_driver_values() {
    for canned in [Value::Int(3), Value::Text("3".into()), Value::Float(3.0)] {
        let (handle, driver) = db();
        driver.push_rows(vec![crate::Row::new().set("count", canned)]);
        let n = handle.query("users").count().await.unwrap();
        assert_eq!(n, 3);
    }
}

#[tokio::test]
async fn count_ignores_projection_paging_and_grouping() {
    let (handle, driver) = db();
    driver.push_rows(vec![crate::Row::new().set("count", 0i64)]);
    handle
        .query("users")
        .select(&["name"])
        .where_(Filter::new().gt("age", 18))
        .group_by(&["name"])
        .having("COUNT(*) > $1", vec![Value::Int(2)])
        .order_by("name", SortDir::Desc)
        .limit(10)
        .offset(5)
        .count()
        .await
        .unwrap();
    assert_eq!(
        driver.statements(),
        vec![r#"SELECT COUNT(*) FROM "users" WHERE "age" > $1"#]
    );
    assert_eq!(driver.calls()[0].params, vec![Value::Int(18)]);
}

#[tokio::test]
async fn execute_requires_a_bound_driver() {
    let err = QueryBuilder::table("users").execute().await.unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn select_projection_sticks_to_builder() {
    let (handle, _) = db();
    let sql = handle
        .query("users")
        .select(&["id", "name"])
        .to_sql()
        .unwrap();
    assert_eq!(sql, r#"SELECT "id", "name" FROM "users""#);
}
