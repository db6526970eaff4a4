use crate::entities::IncidentStatus;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use spage_sdk::objects::{IncidentUpdateEntry, NewIncidentUpdate, format_timestamp};
use sqlx::types::Json;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct IncidentRecord {
    pub id: i64,
    pub org_id: String,
    pub title: String,
    pub status: IncidentStatus,
    pub created_at: time::OffsetDateTime,
    pub service_id: i64,
    /// Append-only update trail, oldest first.
    pub updates: Json<Vec<IncidentUpdateEntry>>,
}

#[derive(Debug, Clone)]
/// List every incident of an organization, oldest first.
pub struct ListIncidents {
    pub org_id: String,
}

impl Processor<ListIncidents> for DatabaseProcessor {
    type Output = Vec<IncidentRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListIncidents")]
    async fn process(&self, query: ListIncidents) -> Result<Vec<IncidentRecord>, sqlx::Error> {
        let incidents = sqlx::query_as::<_, IncidentRecord>(
            r#"
            SELECT id, org_id, title, status, created_at, service_id, updates
            FROM incidents
            WHERE org_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(query.org_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(incidents)
    }
}

#[derive(Debug, Clone)]
/// Get one incident, scoped to its organization.
pub struct GetIncidentById {
    pub org_id: String,
    pub incident_id: i64,
}

impl Processor<GetIncidentById> for DatabaseProcessor {
    type Output = Option<IncidentRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetIncidentById")]
    async fn process(&self, query: GetIncidentById) -> Result<Option<IncidentRecord>, sqlx::Error> {
        let incident = sqlx::query_as::<_, IncidentRecord>(
            r#"
            SELECT id, org_id, title, status, created_at, service_id, updates
            FROM incidents
            WHERE id = $1 AND org_id = $2
            "#,
        )
        .bind(query.incident_id)
        .bind(query.org_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(incident)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Insert a new incident.
///
/// The insert only happens if `service_id` names a service of the same
/// organization; otherwise the output is `None` and nothing is written.
pub struct CreateIncident {
    pub org_id: String,
    pub title: String,
    pub status: IncidentStatus,
    pub service_id: i64,
    pub updates: Vec<IncidentUpdateEntry>,
}

impl Processor<CreateIncident> for DatabaseProcessor {
    type Output = Option<IncidentRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:CreateIncident")]
    async fn process(&self, insert: CreateIncident) -> Result<Option<IncidentRecord>, sqlx::Error> {
        let incident = sqlx::query_as::<_, IncidentRecord>(
            r#"
            INSERT INTO incidents (org_id, title, status, service_id, updates)
            SELECT $1, $2, $3, $4, $5
            WHERE EXISTS (SELECT 1 FROM services WHERE id = $4 AND org_id = $1)
            RETURNING id, org_id, title, status, created_at, service_id, updates
            "#,
        )
        .bind(insert.org_id)
        .bind(insert.title)
        .bind(insert.status)
        .bind(insert.service_id)
        .bind(Json(insert.updates))
        .fetch_optional(&self.pool)
        .await?;
        Ok(incident)
    }
}

/// Result of [`EditIncident`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditIncidentOutcome {
    /// No incident with that id in the organization.
    NotFound,
    /// The requested `service_id` is not a service of the organization.
    ServiceNotFound,
    Edited {
        previous_status: IncidentStatus,
        incident: IncidentRecord,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Change the fields of an incident that are `Some`.
///
/// Runs in one transaction: the incident row is locked, the new service
/// (if any) is checked against the organization, then the row is updated.
pub struct EditIncident {
    pub org_id: String,
    pub incident_id: i64,
    pub title: Option<String>,
    pub status: Option<IncidentStatus>,
    pub service_id: Option<i64>,
    pub updates: Option<Vec<IncidentUpdateEntry>>,
}

impl Processor<EditIncident> for DatabaseProcessor {
    type Output = EditIncidentOutcome;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:EditIncident")]
    async fn process(&self, edit: EditIncident) -> Result<EditIncidentOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let previous_status = sqlx::query_scalar::<_, IncidentStatus>(
            "SELECT status FROM incidents WHERE id = $1 AND org_id = $2 FOR UPDATE",
        )
        .bind(edit.incident_id)
        .bind(&edit.org_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(previous_status) = previous_status else {
            return Ok(EditIncidentOutcome::NotFound);
        };

        if let Some(service_id) = edit.service_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM services WHERE id = $1 AND org_id = $2)",
            )
            .bind(service_id)
            .bind(&edit.org_id)
            .fetch_one(&mut *tx)
            .await?;
            if !exists {
                return Ok(EditIncidentOutcome::ServiceNotFound);
            }
        }

        let incident = sqlx::query_as::<_, IncidentRecord>(
            r#"
            UPDATE incidents
            SET title = COALESCE($3, title),
                status = COALESCE($4, status),
                service_id = COALESCE($5, service_id),
                updates = COALESCE($6, updates)
            WHERE id = $1 AND org_id = $2
            RETURNING id, org_id, title, status, created_at, service_id, updates
            "#,
        )
        .bind(edit.incident_id)
        .bind(edit.org_id)
        .bind(edit.title)
        .bind(edit.status)
        .bind(edit.service_id)
        .bind(edit.updates.map(Json))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(EditIncidentOutcome::Edited {
            previous_status,
            incident,
        })
    }
}

#[derive(Debug, Clone)]
/// Delete one incident.
pub struct DeleteIncident {
    pub org_id: String,
    pub incident_id: i64,
}

impl Processor<DeleteIncident> for DatabaseProcessor {
    type Output = Option<IncidentRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:DeleteIncident")]
    async fn process(&self, query: DeleteIncident) -> Result<Option<IncidentRecord>, sqlx::Error> {
        let incident = sqlx::query_as::<_, IncidentRecord>(
            r#"
            DELETE FROM incidents
            WHERE id = $1 AND org_id = $2
            RETURNING id, org_id, title, status, created_at, service_id, updates
            "#,
        )
        .bind(query.incident_id)
        .bind(query.org_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(incident)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Append one entry to the end of an incident's update trail.
///
/// The append is a single `jsonb` concatenation, so concurrent appends
/// never lose entries.
pub struct AppendIncidentUpdate {
    pub org_id: String,
    pub incident_id: i64,
    pub entry: IncidentUpdateEntry,
}

impl AppendIncidentUpdate {
    /// Build the append from a request body, stamping the entry with `now`
    /// when the caller sent no timestamp (or an empty one).
    pub fn from_request(
        org_id: String,
        incident_id: i64,
        request: NewIncidentUpdate,
        now: time::OffsetDateTime,
    ) -> Self {
        let timestamp = request
            .timestamp
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format_timestamp(now));
        Self {
            org_id,
            incident_id,
            entry: IncidentUpdateEntry {
                message: request.message,
                status: request.status,
                timestamp,
            },
        }
    }
}

impl Processor<AppendIncidentUpdate> for DatabaseProcessor {
    type Output = Option<IncidentRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:AppendIncidentUpdate")]
    async fn process(
        &self,
        append: AppendIncidentUpdate,
    ) -> Result<Option<IncidentRecord>, sqlx::Error> {
        let incident = sqlx::query_as::<_, IncidentRecord>(
            r#"
            UPDATE incidents
            SET updates = updates || $3
            WHERE id = $1 AND org_id = $2
            RETURNING id, org_id, title, status, created_at, service_id, updates
            "#,
        )
        .bind(append.incident_id)
        .bind(append.org_id)
        .bind(Json(vec![append.entry]))
        .fetch_optional(&self.pool)
        .await?;
        Ok(incident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spage_sdk::objects::IncidentStatus as SdkIncidentStatus;
    use time::macros::datetime;

    #[test]
    fn test_append_without_timestamp_is_stamped_now() {
        let request = NewIncidentUpdate {
            message: "Fix deployed".into(),
            status: SdkIncidentStatus::Monitoring,
            timestamp: None,
        };
        let append = AppendIncidentUpdate::from_request(
            "acme".into(),
            3,
            request,
            datetime!(2025-03-01 12:30 UTC),
        );
        assert_eq!(append.entry.timestamp, "2025-03-01T12:30:00Z");
        assert_eq!(append.entry.status, SdkIncidentStatus::Monitoring);
    }

    #[test]
    fn test_append_blank_timestamp_counts_as_missing() {
        let request = NewIncidentUpdate {
            message: "Fix deployed".into(),
            status: SdkIncidentStatus::Monitoring,
            timestamp: Some("  ".into()),
        };
        let append = AppendIncidentUpdate::from_request(
            "acme".into(),
            3,
            request,
            datetime!(2025-03-01 12:30 UTC),
        );
        assert!(!append.entry.timestamp.trim().is_empty());
    }

    #[test]
    fn test_append_keeps_caller_timestamp() {
        let request = NewIncidentUpdate {
            message: "Fix deployed".into(),
            status: SdkIncidentStatus::Resolved,
            timestamp: Some("2025-02-28T08:00:00Z".into()),
        };
        let append = AppendIncidentUpdate::from_request(
            "acme".into(),
            3,
            request,
            datetime!(2025-03-01 12:30 UTC),
        );
        assert_eq!(append.entry.timestamp, "2025-02-28T08:00:00Z");
    }
}
