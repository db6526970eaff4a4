use crate::entities::ServiceStatus;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ServiceRecord {
    pub id: i64,
    pub org_id: String,
    pub name: String,
    pub description: String,
    pub status: ServiceStatus,
    pub uptime: String,
    pub link: String,
}

#[derive(Debug, Clone)]
/// List every service of an organization, oldest first.
pub struct ListServices {
    pub org_id: String,
}

impl Processor<ListServices> for DatabaseProcessor {
    type Output = Vec<ServiceRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListServices")]
    async fn process(&self, query: ListServices) -> Result<Vec<ServiceRecord>, sqlx::Error> {
        let services = sqlx::query_as::<_, ServiceRecord>(
            r#"
            SELECT id, org_id, name, description, status, uptime, link
            FROM services
            WHERE org_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(query.org_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(services)
    }
}

#[derive(Debug, Clone)]
/// Get one service, scoped to its organization.
pub struct GetServiceById {
    pub org_id: String,
    pub service_id: i64,
}

impl Processor<GetServiceById> for DatabaseProcessor {
    type Output = Option<ServiceRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetServiceById")]
    async fn process(&self, query: GetServiceById) -> Result<Option<ServiceRecord>, sqlx::Error> {
        let service = sqlx::query_as::<_, ServiceRecord>(
            r#"
            SELECT id, org_id, name, description, status, uptime, link
            FROM services
            WHERE id = $1 AND org_id = $2
            "#,
        )
        .bind(query.service_id)
        .bind(query.org_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(service)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Insert a new service.
pub struct CreateService {
    pub org_id: String,
    pub name: String,
    pub description: String,
    pub status: ServiceStatus,
    pub uptime: String,
    pub link: String,
}

impl Processor<CreateService> for DatabaseProcessor {
    type Output = ServiceRecord;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:CreateService")]
    async fn process(&self, insert: CreateService) -> Result<ServiceRecord, sqlx::Error> {
        let service = sqlx::query_as::<_, ServiceRecord>(
            r#"
            INSERT INTO services (org_id, name, description, status, uptime, link)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, org_id, name, description, status, uptime, link
            "#,
        )
        .bind(insert.org_id)
        .bind(insert.name)
        .bind(insert.description)
        .bind(insert.status)
        .bind(insert.uptime)
        .bind(insert.link)
        .fetch_one(&self.pool)
        .await?;
        Ok(service)
    }
}

/// A service after an update, together with the status it had before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedService {
    pub previous_status: ServiceStatus,
    pub service: ServiceRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Replace every mutable field of a service.
///
/// The previous status is read under a row lock in the same transaction,
/// so it is exactly the status this update replaced.
pub struct UpdateService {
    pub org_id: String,
    pub service_id: i64,
    pub name: String,
    pub description: String,
    pub status: ServiceStatus,
    pub uptime: String,
    pub link: String,
}

impl Processor<UpdateService> for DatabaseProcessor {
    type Output = Option<UpdatedService>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:UpdateService")]
    async fn process(&self, update: UpdateService) -> Result<Option<UpdatedService>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let previous_status = sqlx::query_scalar::<_, ServiceStatus>(
            "SELECT status FROM services WHERE id = $1 AND org_id = $2 FOR UPDATE",
        )
        .bind(update.service_id)
        .bind(&update.org_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(previous_status) = previous_status else {
            return Ok(None);
        };

        let service = sqlx::query_as::<_, ServiceRecord>(
            r#"
            UPDATE services
            SET name = $3, description = $4, status = $5, uptime = $6, link = $7
            WHERE id = $1 AND org_id = $2
            RETURNING id, org_id, name, description, status, uptime, link
            "#,
        )
        .bind(update.service_id)
        .bind(update.org_id)
        .bind(update.name)
        .bind(update.description)
        .bind(update.status)
        .bind(update.uptime)
        .bind(update.link)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(UpdatedService {
            previous_status,
            service,
        }))
    }
}

/// A deleted service and how many incidents went with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedService {
    pub service: ServiceRecord,
    pub incidents_removed: u64,
}

#[derive(Debug, Clone)]
/// Delete a service and, in the same transaction, all of its incidents.
pub struct DeleteService {
    pub org_id: String,
    pub service_id: i64,
}

impl Processor<DeleteService> for DatabaseProcessor {
    type Output = Option<DeletedService>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:DeleteService")]
    async fn process(&self, query: DeleteService) -> Result<Option<DeletedService>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let incidents = sqlx::query("DELETE FROM incidents WHERE service_id = $1 AND org_id = $2")
            .bind(query.service_id)
            .bind(&query.org_id)
            .execute(&mut *tx)
            .await?;

        let service = sqlx::query_as::<_, ServiceRecord>(
            r#"
            DELETE FROM services
            WHERE id = $1 AND org_id = $2
            RETURNING id, org_id, name, description, status, uptime, link
            "#,
        )
        .bind(query.service_id)
        .bind(query.org_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(service) = service else {
            // Nothing matched; dropping `tx` rolls back the incident delete
            // (which could not have matched anything either).
            return Ok(None);
        };

        tx.commit().await?;
        Ok(Some(DeletedService {
            service,
            incidents_removed: incidents.rows_affected(),
        }))
    }
}
