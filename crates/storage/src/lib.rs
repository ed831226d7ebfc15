use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;
use uuid::Uuid;

use shared::{
    domain::{
        ContactId, ContactSubmission, Project, ProjectId, Service, ServiceId, TeamMember,
        TeamMemberId,
    },
    validation::NormalizedSubmission,
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub client: Option<String>,
    pub tags: Vec<String>,
    pub cover_image_path: Option<String>,
    pub gallery_paths: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub published: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewService {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub icon_path: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTeamMember {
    pub name: String,
    pub role: Option<String>,
    pub bio: Option<String>,
    pub photo_path: Option<String>,
    pub linked_in: Option<String>,
    pub display_order: Option<i64>,
}

const PROJECT_COLUMNS: &str = "id, slug, title, summary, description, client, tags, cover_image_path, gallery_paths, start_date, end_date, published, created_at";

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Inserts one submission row. The identifier and timestamp are assigned
    /// here, never taken from the caller.
    pub async fn insert_contact(
        &self,
        submission: &NormalizedSubmission,
    ) -> Result<ContactSubmission> {
        let id = ContactId::new_v4();
        let created_at = Utc::now();
        sqlx::query(
            "INSERT INTO contacts (id, name, email, company, message, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.0.to_string())
        .bind(&submission.name)
        .bind(&submission.email)
        .bind(submission.company.as_deref())
        .bind(&submission.message)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .context("failed to insert contact submission")?;
        debug!(contact_id = %id, "contact submission stored");

        Ok(ContactSubmission {
            id,
            name: submission.name.clone(),
            email: submission.email.clone(),
            company: submission.company.clone(),
            message: submission.message.clone(),
            created_at,
        })
    }

    pub async fn list_contacts(&self, limit: u32) -> Result<Vec<ContactSubmission>> {
        let rows = sqlx::query(
            "SELECT id, name, email, company, message, created_at
             FROM contacts
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                Ok(ContactSubmission {
                    id: ContactId(parse_uuid(r, "id")?),
                    name: r.get::<String, _>("name"),
                    email: r.get::<String, _>("email"),
                    company: r.get::<Option<String>, _>("company"),
                    message: r.get::<String, _>("message"),
                    created_at: r.get::<DateTime<Utc>, _>("created_at"),
                })
            })
            .collect()
    }

    pub async fn count_contacts(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn insert_project(&self, project: &NewProject) -> Result<ProjectId> {
        let id = ProjectId::new_v4();
        sqlx::query(
            "INSERT INTO projects (id, slug, title, summary, description, client, tags, cover_image_path, gallery_paths, start_date, end_date, published, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.0.to_string())
        .bind(&project.slug)
        .bind(&project.title)
        .bind(project.summary.as_deref())
        .bind(project.description.as_deref())
        .bind(project.client.as_deref())
        .bind(serde_json::to_string(&project.tags)?)
        .bind(project.cover_image_path.as_deref())
        .bind(serde_json::to_string(&project.gallery_paths)?)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(project.published)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to insert project '{}'", project.slug))?;
        Ok(id)
    }

    /// Published projects, newest first.
    pub async fn list_published_projects(&self) -> Result<Vec<Project>> {
        let rows = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE published = 1 ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(project_from_row).collect()
    }

    pub async fn project_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        let row = sqlx::query(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE slug = ?"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(project_from_row).transpose()
    }

    pub async fn insert_service(&self, service: &NewService) -> Result<ServiceId> {
        let id = ServiceId::new_v4();
        sqlx::query(
            "INSERT INTO services (id, slug, name, description, icon_path, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.0.to_string())
        .bind(&service.slug)
        .bind(&service.name)
        .bind(service.description.as_deref())
        .bind(service.icon_path.as_deref())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to insert service '{}'", service.slug))?;
        Ok(id)
    }

    /// Services in the order they were added.
    pub async fn list_services(&self) -> Result<Vec<Service>> {
        let rows = sqlx::query(
            "SELECT id, slug, name, description, icon_path, created_at FROM services ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|r| {
                Ok(Service {
                    id: ServiceId(parse_uuid(r, "id")?),
                    slug: r.get::<String, _>("slug"),
                    name: r.get::<String, _>("name"),
                    description: r.get::<Option<String>, _>("description"),
                    icon_path: r.get::<Option<String>, _>("icon_path"),
                    created_at: r.get::<DateTime<Utc>, _>("created_at"),
                })
            })
            .collect()
    }

    pub async fn insert_team_member(&self, member: &NewTeamMember) -> Result<TeamMemberId> {
        let id = TeamMemberId::new_v4();
        sqlx::query(
            "INSERT INTO team (id, name, role, bio, photo_path, linked_in, display_order, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.0.to_string())
        .bind(&member.name)
        .bind(member.role.as_deref())
        .bind(member.bio.as_deref())
        .bind(member.photo_path.as_deref())
        .bind(member.linked_in.as_deref())
        .bind(member.display_order)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to insert team member '{}'", member.name))?;
        Ok(id)
    }

    /// Team members by `display_order`; unordered members go last, by name.
    pub async fn list_team(&self) -> Result<Vec<TeamMember>> {
        let rows = sqlx::query(
            "SELECT id, name, role, bio, photo_path, linked_in, display_order, created_at
             FROM team
             ORDER BY display_order IS NULL, display_order ASC, name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|r| {
                Ok(TeamMember {
                    id: TeamMemberId(parse_uuid(r, "id")?),
                    name: r.get::<String, _>("name"),
                    role: r.get::<Option<String>, _>("role"),
                    bio: r.get::<Option<String>, _>("bio"),
                    photo_path: r.get::<Option<String>, _>("photo_path"),
                    linked_in: r.get::<Option<String>, _>("linked_in"),
                    display_order: r.get::<Option<i64>, _>("display_order"),
                    created_at: r.get::<DateTime<Utc>, _>("created_at"),
                })
            })
            .collect()
    }
}

fn project_from_row(r: &SqliteRow) -> Result<Project> {
    Ok(Project {
        id: ProjectId(parse_uuid(r, "id")?),
        slug: r.get::<String, _>("slug"),
        title: r.get::<String, _>("title"),
        summary: r.get::<Option<String>, _>("summary"),
        description: r.get::<Option<String>, _>("description"),
        client: r.get::<Option<String>, _>("client"),
        tags: parse_string_list(r, "tags")?,
        cover_image_path: r.get::<Option<String>, _>("cover_image_path"),
        gallery_paths: parse_string_list(r, "gallery_paths")?,
        start_date: r.get::<Option<NaiveDate>, _>("start_date"),
        end_date: r.get::<Option<NaiveDate>, _>("end_date"),
        published: r.get::<bool, _>("published"),
        created_at: r.get::<DateTime<Utc>, _>("created_at"),
    })
}

fn parse_uuid(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).with_context(|| format!("invalid uuid '{raw}' in column {column}"))
}

fn parse_string_list(row: &SqliteRow, column: &str) -> Result<Vec<String>> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).with_context(|| format!("invalid json list in column {column}"))
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
