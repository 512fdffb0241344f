use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::MySqlPool;

use super::{AttendanceFilter, AttendanceRepository, RepositoryError};
use crate::model::attendance::{Attendance, NewAttendance};

/// MySQL backend. The `attendance` table carries a unique key over
/// (user_id, DATE(check_in)), which is the authoritative guard against two
/// requests racing past the existence check.
pub struct MySqlAttendanceRepository {
    pool: MySqlPool,
}

impl MySqlAttendanceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Date(NaiveDate),
}

#[async_trait]
impl AttendanceRepository for MySqlAttendanceRepository {
    async fn find_for_date(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, RepositoryError> {
        let record = sqlx::query_as::<_, Attendance>(
            r#"
            SELECT id, user_id, check_in, latitude, longitude, jarak, status
            FROM attendance
            WHERE user_id = ? AND DATE(check_in) = ?
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn insert(&self, record: NewAttendance) -> Result<Attendance, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (user_id, check_in, latitude, longitude, jarak, status)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.user_id)
        .bind(record.check_in)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(record.jarak)
        .bind(record.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(Attendance {
            id: result.last_insert_id(),
            user_id: record.user_id,
            check_in: record.check_in,
            latitude: record.latitude,
            longitude: record.longitude,
            jarak: record.jarak,
            status: record.status.as_str().to_string(),
        })
    }

    async fn list(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<(Vec<Attendance>, i64), RepositoryError> {
        // -------------------------
        // WHERE clause
        // -------------------------
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(user_id) = filter.user_id {
            where_sql.push_str(" AND user_id = ?");
            args.push(FilterValue::U64(user_id));
        }

        if let Some(date) = filter.date {
            where_sql.push_str(" AND DATE(check_in) = ?");
            args.push(FilterValue::Date(date));
        }

        // -------------------------
        // COUNT query
        // -------------------------
        let count_sql = format!("SELECT COUNT(*) FROM attendance{}", where_sql);

        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Date(d) => count_q.bind(*d),
            };
        }

        let total = count_q.fetch_one(&self.pool).await?;

        // -------------------------
        // DATA query
        // -------------------------
        let (page, per_page) = filter.pagination();
        let offset = (page - 1) * per_page;

        let data_sql = format!(
            r#"
            SELECT id, user_id, check_in, latitude, longitude, jarak, status
            FROM attendance
            {}
            ORDER BY check_in DESC
            LIMIT ? OFFSET ?
            "#,
            where_sql
        );

        let mut data_q = sqlx::query_as::<_, Attendance>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Date(d) => data_q.bind(d),
            };
        }

        let records = data_q
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((records, total))
    }
}
