use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};

use super::connection::init_survey_db;
use super::{PageSlice, SurveyStore};
use crate::domain::error::{AppError, Result};
use crate::domain::survey::{NewSurveyRecord, SentimentCounts, SentimentLabel, SurveyRecord};
use crate::domain::survey_query::{
    zero_filled_distribution, GroupBy, GroupKey, OpenTextGroup, QuestionId, RatingGroup,
    RatingSummary, ResponseCount, SurveyFilter,
};

const SELECT_COLUMNS: &str = "id, age, gender, zip_code, city, state, income, education_level, \
     q1_rating, q2_rating, q3_open, q4_rating, q5_open, sentiment_label, is_human";

const INSERT_SQL: &str = "INSERT INTO surveys (age, gender, zip_code, city, state, income, \
     education_level, q1_rating, q2_rating, q3_open, q4_rating, q5_open, sentiment_label, is_human) ";

/// 14 bound values per row; 64 rows stays under SQLite's 999 parameter limit.
const INSERT_CHUNK_ROWS: usize = 64;

pub struct SurveyRepository {
    pool: SqlitePool,
}

impl SurveyRepository {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = init_survey_db(database_url, max_connections).await?;
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

struct WhereClause {
    sql: String,
    binds: Vec<String>,
}

/// Filter predicates first, then `extra` clauses; callers bind in that order.
fn where_clause(filter: &SurveyFilter, extra: &[String]) -> WhereClause {
    let predicates = filter.predicates();
    let mut clauses: Vec<String> = predicates
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect();
    clauses.extend(extra.iter().cloned());

    let sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    WhereClause {
        sql,
        binds: predicates.into_iter().map(|(_, value)| value).collect(),
    }
}

fn db_err(context: &str) -> impl Fn(sqlx::Error) -> AppError + '_ {
    move |e| AppError::DatabaseError(format!("{}: {}", context, e))
}

fn group_key(row: &SqliteRow, group_by: GroupBy) -> Result<GroupKey> {
    if group_by.is_numeric() {
        row.try_get::<i64, _>("grp")
            .map(GroupKey::Number)
            .map_err(db_err("Failed to decode group value"))
    } else {
        row.try_get::<String, _>("grp")
            .map(GroupKey::Text)
            .map_err(db_err("Failed to decode group value"))
    }
}

async fn fetch_after(
    conn: &mut SqliteConnection,
    filter: &SurveyFilter,
    after_id: Option<i64>,
    limit: i64,
) -> Result<Vec<SurveyRecord>> {
    let extra: Vec<String> = after_id.iter().map(|_| "id > ?".to_string()).collect();
    let clause = where_clause(filter, &extra);
    let sql = format!(
        "SELECT {} FROM surveys{} ORDER BY id ASC LIMIT ?",
        SELECT_COLUMNS, clause.sql
    );

    let mut query = sqlx::query_as::<_, SurveyEntity>(&sql);
    for value in clause.binds {
        query = query.bind(value);
    }
    if let Some(after_id) = after_id {
        query = query.bind(after_id);
    }

    let entities = query
        .bind(limit)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_err("Failed to list surveys"))?;

    into_records(entities)
}

async fn fetch_count(conn: &mut SqliteConnection, filter: &SurveyFilter) -> Result<i64> {
    let clause = where_clause(filter, &[]);
    let sql = format!("SELECT COUNT(*) FROM surveys{}", clause.sql);

    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for value in clause.binds {
        query = query.bind(value);
    }

    query
        .fetch_one(&mut *conn)
        .await
        .map_err(db_err("Failed to count surveys"))
}

async fn fetch_sentiment_counts(
    conn: &mut SqliteConnection,
    filter: &SurveyFilter,
) -> Result<SentimentCounts> {
    let clause = where_clause(filter, &[]);
    let sql = format!(
        "SELECT sentiment_label, COUNT(*) AS n FROM surveys{} GROUP BY sentiment_label",
        clause.sql
    );

    let mut query = sqlx::query_as::<_, (String, i64)>(&sql);
    for value in clause.binds {
        query = query.bind(value);
    }

    let rows = query
        .fetch_all(&mut *conn)
        .await
        .map_err(db_err("Failed to count sentiment labels"))?;

    let mut counts = SentimentCounts::default();
    for (label, count) in rows {
        let label = label.parse::<SentimentLabel>().map_err(|err| {
            AppError::DatabaseError(format!("Stored survey data is inconsistent: {}", err))
        })?;
        counts.add(label, count);
    }
    Ok(counts)
}

async fn fetch_generation(conn: &mut SqliteConnection) -> Result<i64> {
    let generation = sqlx::query_scalar::<_, i64>(
        "SELECT value FROM dataset_meta WHERE key = 'generation'",
    )
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_err("Failed to read dataset generation"))?;

    Ok(generation.unwrap_or(0))
}

#[async_trait]
impl SurveyStore for SurveyRepository {
    async fn replace_all(&self, records: &[NewSurveyRecord]) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin survey replace transaction"))?;

        let deleted = sqlx::query("DELETE FROM surveys")
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to clear surveys"))?
            .rows_affected();

        let mut inserted: u64 = 0;
        for chunk in records.chunks(INSERT_CHUNK_ROWS) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(INSERT_SQL);
            builder.push_values(chunk, |mut row, record| {
                row.push_bind(record.age)
                    .push_bind(record.gender.clone())
                    .push_bind(record.zip_code.clone())
                    .push_bind(record.city.clone())
                    .push_bind(record.state.clone())
                    .push_bind(record.income.clone())
                    .push_bind(record.education_level.clone())
                    .push_bind(record.q1_rating)
                    .push_bind(record.q2_rating)
                    .push_bind(record.q3_open.clone())
                    .push_bind(record.q4_rating)
                    .push_bind(record.q5_open.clone())
                    .push_bind(record.sentiment_label.as_str())
                    .push_bind(record.is_human);
            });

            inserted += builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(db_err("Failed to insert surveys"))?
                .rows_affected();
        }

        sqlx::query("UPDATE dataset_meta SET value = value + 1 WHERE key = 'generation'")
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to bump dataset generation"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit survey replace transaction"))?;

        tracing::info!(deleted, inserted, "Survey dataset replaced");
        Ok(inserted)
    }

    async fn insert(&self, record: &NewSurveyRecord) -> Result<SurveyRecord> {
        let sql = format!(
            "{}VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            INSERT_SQL
        );
        let result = sqlx::query(&sql)
            .bind(record.age)
            .bind(&record.gender)
            .bind(&record.zip_code)
            .bind(&record.city)
            .bind(&record.state)
            .bind(&record.income)
            .bind(&record.education_level)
            .bind(record.q1_rating)
            .bind(record.q2_rating)
            .bind(&record.q3_open)
            .bind(record.q4_rating)
            .bind(&record.q5_open)
            .bind(record.sentiment_label.as_str())
            .bind(record.is_human)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to insert survey"))?;

        Ok(record.clone().with_id(result.last_insert_rowid()))
    }

    async fn page_after(
        &self,
        filter: &SurveyFilter,
        after_id: Option<i64>,
        limit: i64,
    ) -> Result<PageSlice> {
        // One read transaction, so the page and the totals share a snapshot.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin survey read transaction"))?;

        let generation = fetch_generation(&mut *tx).await?;
        let items = fetch_after(&mut *tx, filter, after_id, limit).await?;
        let total = fetch_count(&mut *tx, filter).await?;
        let sentiment_counts = fetch_sentiment_counts(&mut *tx, filter).await?;

        tx.commit()
            .await
            .map_err(db_err("Failed to finish survey read transaction"))?;

        Ok(PageSlice {
            generation,
            items,
            total,
            sentiment_counts,
        })
    }

    async fn list_matching(&self, filter: &SurveyFilter) -> Result<Vec<SurveyRecord>> {
        let clause = where_clause(filter, &[]);
        let sql = format!(
            "SELECT {} FROM surveys{} ORDER BY id ASC",
            SELECT_COLUMNS, clause.sql
        );

        let mut query = sqlx::query_as::<_, SurveyEntity>(&sql);
        for value in clause.binds {
            query = query.bind(value);
        }

        let entities = query
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to list surveys"))?;

        into_records(entities)
    }

    async fn count(&self, filter: &SurveyFilter) -> Result<i64> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_err("Failed to acquire survey connection"))?;
        fetch_count(&mut *conn, filter).await
    }

    async fn sentiment_counts(&self, filter: &SurveyFilter) -> Result<SentimentCounts> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_err("Failed to acquire survey connection"))?;
        fetch_sentiment_counts(&mut *conn, filter).await
    }

    async fn generation(&self) -> Result<i64> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_err("Failed to acquire survey connection"))?;
        fetch_generation(&mut *conn).await
    }

    async fn rating_summary(
        &self,
        question: QuestionId,
        filter: &SurveyFilter,
    ) -> Result<RatingSummary> {
        let column = question.column();
        let clause = where_clause(filter, &[]);

        // Summary and distribution come from one statement so they always agree.
        let sql = format!(
            "SELECT AVG({c}) AS average, MIN({c}) AS min_rating, MAX({c}) AS max_rating, \
             COUNT({c}) AS n, \
             SUM(CASE WHEN {c} = 1 THEN 1 ELSE 0 END) AS r1, \
             SUM(CASE WHEN {c} = 2 THEN 1 ELSE 0 END) AS r2, \
             SUM(CASE WHEN {c} = 3 THEN 1 ELSE 0 END) AS r3, \
             SUM(CASE WHEN {c} = 4 THEN 1 ELSE 0 END) AS r4, \
             SUM(CASE WHEN {c} = 5 THEN 1 ELSE 0 END) AS r5 \
             FROM surveys{w}",
            c = column,
            w = clause.sql
        );
        let mut query = sqlx::query(&sql);
        for value in clause.binds {
            query = query.bind(value);
        }
        let row = query
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("Failed to summarize ratings"))?;

        let decode = db_err("Failed to decode rating summary");
        let average: Option<f64> = row.try_get("average").map_err(&decode)?;
        let min: Option<i64> = row.try_get("min_rating").map_err(&decode)?;
        let max: Option<i64> = row.try_get("max_rating").map_err(&decode)?;
        let count: i64 = row.try_get("n").map_err(&decode)?;

        let mut buckets = Vec::with_capacity(5);
        for rating in 1..=5_i64 {
            let bucket: Option<i64> = row
                .try_get(format!("r{}", rating).as_str())
                .map_err(&decode)?;
            buckets.push((rating, bucket.unwrap_or(0)));
        }

        Ok(RatingSummary {
            average,
            min,
            max,
            count,
            distribution: zero_filled_distribution(&buckets),
        })
    }

    async fn rating_groups(
        &self,
        question: QuestionId,
        group_by: GroupBy,
        filter: &SurveyFilter,
    ) -> Result<Vec<RatingGroup>> {
        let clause = where_clause(filter, &[]);
        let sql = format!(
            "SELECT {g} AS grp, AVG({c}) AS average, COUNT({c}) AS n FROM surveys{w} \
             GROUP BY {g} ORDER BY {g} ASC",
            g = group_by.column(),
            c = question.column(),
            w = clause.sql
        );

        let mut query = sqlx::query(&sql);
        for value in clause.binds {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to group ratings"))?;

        let decode = db_err("Failed to decode rating group");
        rows.iter()
            .map(|row| {
                Ok(RatingGroup {
                    group: group_key(row, group_by)?,
                    average: row.try_get("average").map_err(&decode)?,
                    count: row.try_get("n").map_err(&decode)?,
                })
            })
            .collect()
    }

    async fn open_text_counts(
        &self,
        question: QuestionId,
        filter: &SurveyFilter,
    ) -> Result<Vec<ResponseCount>> {
        let column = question.column();
        let clause = where_clause(filter, &[format!("{} <> ''", column)]);
        let sql = format!(
            "SELECT {c} AS response, COUNT(*) AS n FROM surveys{w} \
             GROUP BY {c} ORDER BY n DESC, {c} ASC",
            c = column,
            w = clause.sql
        );

        let mut query = sqlx::query_as::<_, (String, i64)>(&sql);
        for value in clause.binds {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to count open-text responses"))?;

        Ok(rows
            .into_iter()
            .map(|(response, count)| ResponseCount { response, count })
            .collect())
    }

    async fn open_text_groups(
        &self,
        question: QuestionId,
        group_by: GroupBy,
        filter: &SurveyFilter,
    ) -> Result<Vec<OpenTextGroup>> {
        let column = question.column();
        let clause = where_clause(filter, &[format!("{} <> ''", column)]);
        let sql = format!(
            "SELECT {g} AS grp, {c} AS response, COUNT(*) AS n FROM surveys{w} \
             GROUP BY {g}, {c} ORDER BY {g} ASC, n DESC, {c} ASC",
            g = group_by.column(),
            c = column,
            w = clause.sql
        );

        let mut query = sqlx::query(&sql);
        for value in clause.binds {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to group open-text responses"))?;

        let decode = db_err("Failed to decode open-text group");
        let mut groups: Vec<OpenTextGroup> = Vec::new();
        for row in &rows {
            let group = group_key(row, group_by)?;
            let response = ResponseCount {
                response: row.try_get("response").map_err(&decode)?,
                count: row.try_get("n").map_err(&decode)?,
            };
            match groups.last_mut() {
                Some(last) if last.group == group => last.responses.push(response),
                _ => groups.push(OpenTextGroup {
                    group,
                    responses: vec![response],
                }),
            }
        }
        Ok(groups)
    }
}

// Internal entity for database mapping
#[derive(sqlx::FromRow)]
struct SurveyEntity {
    id: i64,
    age: i64,
    gender: String,
    zip_code: String,
    city: String,
    state: String,
    income: String,
    education_level: String,
    q1_rating: i64,
    q2_rating: i64,
    q3_open: String,
    q4_rating: i64,
    q5_open: String,
    sentiment_label: String,
    is_human: bool,
}

impl TryFrom<SurveyEntity> for SurveyRecord {
    type Error = AppError;

    fn try_from(e: SurveyEntity) -> Result<Self> {
        let sentiment_label = e.sentiment_label.parse::<SentimentLabel>().map_err(|err| {
            AppError::DatabaseError(format!("Survey {} is inconsistent: {}", e.id, err))
        })?;

        Ok(Self {
            id: e.id,
            age: e.age,
            gender: e.gender,
            zip_code: e.zip_code,
            city: e.city,
            state: e.state,
            income: e.income,
            education_level: e.education_level,
            q1_rating: e.q1_rating,
            q2_rating: e.q2_rating,
            q3_open: e.q3_open,
            q4_rating: e.q4_rating,
            q5_open: e.q5_open,
            sentiment_label,
            is_human: e.is_human,
        })
    }
}

fn into_records(entities: Vec<SurveyEntity>) -> Result<Vec<SurveyRecord>> {
    entities.into_iter().map(SurveyRecord::try_from).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::BTreeMap;

    pub(crate) async fn memory_repository() -> SurveyRepository {
        SurveyRepository::connect("sqlite::memory:", 1).await.unwrap()
    }

    pub(crate) fn sample_record(
        q1_rating: i64,
        sentiment_label: SentimentLabel,
        gender: &str,
    ) -> NewSurveyRecord {
        NewSurveyRecord {
            age: 30,
            gender: gender.to_string(),
            zip_code: "10001".to_string(),
            city: "New York".to_string(),
            state: "NY".to_string(),
            income: "50k-75k".to_string(),
            education_level: "Bachelor".to_string(),
            q1_rating,
            q2_rating: 3,
            q3_open: String::new(),
            q4_rating: 4,
            q5_open: String::new(),
            sentiment_label,
            is_human: true,
        }
    }

    #[tokio::test]
    async fn test_replace_all_assigns_increasing_ids() {
        let repo = memory_repository().await;
        let records = vec![
            sample_record(5, SentimentLabel::Positive, "Female"),
            sample_record(3, SentimentLabel::Negative, "Male"),
        ];
        assert_eq!(repo.replace_all(&records).await.unwrap(), 2);
        assert_eq!(repo.generation().await.unwrap(), 1);

        let first = repo.list_matching(&SurveyFilter::default()).await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(first[0].id < first[1].id);

        repo.replace_all(&records[..1]).await.unwrap();
        let second = repo.list_matching(&SurveyFilter::default()).await.unwrap();
        assert_eq!(second.len(), 1);
        assert!(second[0].id > first[1].id);
        assert_eq!(repo.generation().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_replace_all_is_atomic() {
        let repo = memory_repository().await;
        let previous = vec![sample_record(4, SentimentLabel::Neutral, "Female")];
        repo.replace_all(&previous).await.unwrap();

        // The second row violates the rating CHECK constraint.
        let bad = vec![
            sample_record(2, SentimentLabel::Positive, "Male"),
            sample_record(9, SentimentLabel::Positive, "Male"),
        ];
        assert!(repo.replace_all(&bad).await.is_err());

        let remaining = repo.list_matching(&SurveyFilter::default()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].q1_rating, 4);
        assert_eq!(repo.generation().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replace_all_spans_insert_chunks() {
        let repo = memory_repository().await;
        let records: Vec<NewSurveyRecord> = (0..150)
            .map(|i| sample_record(1 + i % 5, SentimentLabel::Positive, "Female"))
            .collect();
        assert_eq!(repo.replace_all(&records).await.unwrap(), 150);
        assert_eq!(repo.count(&SurveyFilter::default()).await.unwrap(), 150);
    }

    #[tokio::test]
    async fn test_page_after_applies_filter_and_keyset() {
        let repo = memory_repository().await;
        let records = vec![
            sample_record(5, SentimentLabel::Positive, "Female"),
            sample_record(3, SentimentLabel::Negative, "Male"),
            sample_record(4, SentimentLabel::Positive, "Female"),
            sample_record(2, SentimentLabel::Positive, "Female"),
        ];
        repo.replace_all(&records).await.unwrap();

        let filter = SurveyFilter {
            gender: Some("Female".to_string()),
            ..SurveyFilter::default()
        };
        let page = repo.page_after(&filter, None, 2).await.unwrap();
        assert_eq!(page.generation, 1);
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|record| record.gender == "Female"));
        assert_eq!(page.total, 3);
        assert_eq!(page.sentiment_counts.positive, 3);

        let rest = repo
            .page_after(&filter, Some(page.items[1].id), 2)
            .await
            .unwrap();
        assert_eq!(rest.items.len(), 1);
        assert_eq!(rest.items[0].q1_rating, 2);
        assert_eq!(rest.total, 3);
    }

    fn generation_records(generation: i64) -> Vec<NewSurveyRecord> {
        (0..=generation)
            .map(|_| {
                let mut record =
                    sample_record(generation % 5 + 1, SentimentLabel::Positive, "Female");
                record.age = generation;
                record
            })
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reads_stay_consistent_during_replace() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "survey-api-snapshot-{}-{}.db",
            std::process::id(),
            nanos
        ));
        let url = format!("sqlite://{}", path.display());

        let repo = std::sync::Arc::new(SurveyRepository::connect(&url, 4).await.unwrap());
        repo.replace_all(&generation_records(1)).await.unwrap();

        let writer_repo = repo.clone();
        let writer = tokio::spawn(async move {
            for generation in 2..=40 {
                writer_repo
                    .replace_all(&generation_records(generation))
                    .await
                    .unwrap();
            }
        });

        for _ in 0..200 {
            let slice = repo
                .page_after(&SurveyFilter::default(), None, 100)
                .await
                .unwrap();
            assert_eq!(slice.total, slice.generation + 1);
            assert_eq!(slice.items.len() as i64, slice.total);
            assert_eq!(slice.sentiment_counts.total(), slice.total);
            assert!(slice
                .items
                .iter()
                .all(|record| record.age == slice.generation));

            let summary = repo
                .rating_summary(QuestionId::Q1Rating, &SurveyFilter::default())
                .await
                .unwrap();
            assert_eq!(summary.distribution.values().sum::<i64>(), summary.count);
            assert_eq!(
                summary.distribution.values().filter(|n| **n > 0).count(),
                1
            );
            assert_eq!(summary.min, summary.max);

            tokio::task::yield_now().await;
        }

        writer.await.unwrap();
        assert_eq!(repo.generation().await.unwrap(), 40);
        repo.close().await;

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[tokio::test]
    async fn test_sentiment_counts_are_filter_scoped() {
        let repo = memory_repository().await;
        repo.replace_all(&[
            sample_record(5, SentimentLabel::Positive, "Female"),
            sample_record(3, SentimentLabel::Negative, "Male"),
            sample_record(4, SentimentLabel::Positive, "Male"),
        ])
        .await
        .unwrap();

        let all = repo.sentiment_counts(&SurveyFilter::default()).await.unwrap();
        assert_eq!(all.positive, 2);
        assert_eq!(all.negative, 1);
        assert_eq!(all.neutral, 0);

        let male = SurveyFilter {
            gender: Some("Male".to_string()),
            ..SurveyFilter::default()
        };
        assert_eq!(repo.sentiment_counts(&male).await.unwrap().total(), 2);
    }

    #[tokio::test]
    async fn test_insert_appends_without_bumping_generation() {
        let repo = memory_repository().await;
        repo.replace_all(&[sample_record(5, SentimentLabel::Positive, "Female")])
            .await
            .unwrap();
        let created = repo
            .insert(&sample_record(1, SentimentLabel::Neutral, "Male"))
            .await
            .unwrap();
        assert!(created.id > 0);
        assert_eq!(created.sentiment_label, SentimentLabel::Neutral);
        assert_eq!(repo.generation().await.unwrap(), 1);
        assert_eq!(repo.count(&SurveyFilter::default()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_rating_summary_and_distribution() {
        let repo = memory_repository().await;
        let records: Vec<NewSurveyRecord> = [5, 5, 3, 1]
            .into_iter()
            .map(|rating| sample_record(rating, SentimentLabel::Positive, "Female"))
            .collect();
        repo.replace_all(&records).await.unwrap();

        let summary = repo
            .rating_summary(QuestionId::Q1Rating, &SurveyFilter::default())
            .await
            .unwrap();
        assert_eq!(summary.average, Some(3.5));
        assert_eq!(summary.min, Some(1));
        assert_eq!(summary.max, Some(5));
        assert_eq!(summary.count, 4);
        let expected: BTreeMap<String, i64> = [("1", 1), ("2", 0), ("3", 1), ("4", 0), ("5", 2)]
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        assert_eq!(summary.distribution, expected);
    }

    #[tokio::test]
    async fn test_rating_summary_on_empty_view() {
        let repo = memory_repository().await;
        let summary = repo
            .rating_summary(QuestionId::Q2Rating, &SurveyFilter::default())
            .await
            .unwrap();
        assert_eq!(summary.average, None);
        assert_eq!(summary.min, None);
        assert_eq!(summary.count, 0);
        assert!(summary.distribution.values().all(|count| *count == 0));
    }

    #[tokio::test]
    async fn test_rating_groups_by_age_are_numeric() {
        let repo = memory_repository().await;
        let mut young = sample_record(2, SentimentLabel::Negative, "Male");
        young.age = 9;
        let mut old = sample_record(4, SentimentLabel::Positive, "Female");
        old.age = 70;
        let mut old_too = sample_record(5, SentimentLabel::Positive, "Female");
        old_too.age = 70;
        repo.replace_all(&[old, young, old_too]).await.unwrap();

        let groups = repo
            .rating_groups(QuestionId::Q1Rating, GroupBy::Age, &SurveyFilter::default())
            .await
            .unwrap();
        assert_eq!(
            groups,
            vec![
                RatingGroup {
                    group: GroupKey::Number(9),
                    average: 2.0,
                    count: 1
                },
                RatingGroup {
                    group: GroupKey::Number(70),
                    average: 4.5,
                    count: 2
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_open_text_counts_and_groups() {
        let repo = memory_repository().await;
        let answers = [
            ("Female", "Great staff"),
            ("Male", "Great staff"),
            ("Female", "Too slow"),
            ("Male", ""),
        ];
        let records: Vec<NewSurveyRecord> = answers
            .iter()
            .map(|(gender, answer)| {
                let mut record = sample_record(3, SentimentLabel::Neutral, gender);
                record.q5_open = answer.to_string();
                record
            })
            .collect();
        repo.replace_all(&records).await.unwrap();

        let counts = repo
            .open_text_counts(QuestionId::Q5Open, &SurveyFilter::default())
            .await
            .unwrap();
        assert_eq!(
            counts,
            vec![
                ResponseCount {
                    response: "Great staff".to_string(),
                    count: 2
                },
                ResponseCount {
                    response: "Too slow".to_string(),
                    count: 1
                },
            ]
        );

        let groups = repo
            .open_text_groups(QuestionId::Q5Open, GroupBy::Gender, &SurveyFilter::default())
            .await
            .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group, GroupKey::Text("Female".to_string()));
        assert_eq!(groups[0].responses.len(), 2);
        assert_eq!(groups[1].group, GroupKey::Text("Male".to_string()));
        assert_eq!(groups[1].responses[0].response, "Great staff");
    }
}
