use super::*;

fn submission(company: Option<&str>) -> NormalizedSubmission {
    NormalizedSubmission {
        name: "Jane Doe".to_string(),
        email: "jane@example.com".to_string(),
        company: company.map(str::to_string),
        message: "Hello".to_string(),
    }
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("site.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn insert_contact_assigns_id_and_timestamp() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let before = Utc::now();
    let stored = storage
        .insert_contact(&submission(None))
        .await
        .expect("insert");

    assert!(stored.created_at >= before);
    assert_eq!(stored.company, None);

    let listed = storage.list_contacts(10).await.expect("list");
    assert_eq!(listed, vec![stored]);
}

#[tokio::test]
async fn identical_submissions_create_distinct_rows() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let first = storage
        .insert_contact(&submission(Some("Acme")))
        .await
        .expect("first");
    let second = storage
        .insert_contact(&submission(Some("Acme")))
        .await
        .expect("second");

    assert_ne!(first.id, second.id);
    assert_eq!(storage.count_contacts().await.expect("count"), 2);
}

#[tokio::test]
async fn lists_contacts_newest_first_with_limit() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(storage.insert_contact(&submission(None)).await.expect("insert").id);
    }

    let listed = storage.list_contacts(2).await.expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, ids[2]);
    assert_eq!(listed[1].id, ids[1]);
}

#[tokio::test]
async fn only_published_projects_are_listed() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .insert_project(&NewProject {
            slug: "substation-retrofit".into(),
            title: "Substation Retrofit".into(),
            tags: vec!["power".into(), "retrofit".into()],
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            published: true,
            ..NewProject::default()
        })
        .await
        .expect("published");
    storage
        .insert_project(&NewProject {
            slug: "draft".into(),
            title: "Draft".into(),
            published: false,
            ..NewProject::default()
        })
        .await
        .expect("draft");

    let projects = storage.list_published_projects().await.expect("list");
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].tags, vec!["power", "retrofit"]);
    assert_eq!(projects[0].start_date, NaiveDate::from_ymd_opt(2024, 3, 1));

    let draft = storage
        .project_by_slug("draft")
        .await
        .expect("lookup")
        .expect("draft exists");
    assert!(!draft.published);
    assert!(storage
        .project_by_slug("missing")
        .await
        .expect("lookup")
        .is_none());
}

#[tokio::test]
async fn team_is_ordered_by_display_order_then_name() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    for (name, order) in [("Zoe", None), ("Bob", Some(2)), ("Ann", Some(1)), ("Al", None)] {
        storage
            .insert_team_member(&NewTeamMember {
                name: name.into(),
                display_order: order,
                ..NewTeamMember::default()
            })
            .await
            .expect("member");
    }

    let names: Vec<String> = storage
        .list_team()
        .await
        .expect("team")
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, vec!["Ann", "Bob", "Al", "Zoe"]);
}

#[tokio::test]
async fn duplicate_service_slug_is_rejected() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let service = NewService {
        slug: "power-systems".into(),
        name: "Power Systems".into(),
        ..NewService::default()
    };
    storage.insert_service(&service).await.expect("first");
    assert!(storage.insert_service(&service).await.is_err());
    assert_eq!(storage.list_services().await.expect("services").len(), 1);
}

#[tokio::test]
async fn services_are_listed_in_insertion_order() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    for (slug, name) in [("zeta", "Zeta"), ("alpha", "Alpha")] {
        storage
            .insert_service(&NewService {
                slug: slug.into(),
                name: name.into(),
                ..NewService::default()
            })
            .await
            .expect("service");
    }

    let names: Vec<String> = storage
        .list_services()
        .await
        .expect("services")
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["Zeta", "Alpha"]);
}
