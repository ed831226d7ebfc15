use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use storage::{NewProject, NewService, NewTeamMember, Storage};

/// Operator tool for seeding site content and reading submissions.
#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/site.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    AddProject {
        slug: String,
        title: String,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        client: Option<String>,
        /// Repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        cover_image: Option<String>,
        #[arg(long = "gallery")]
        gallery: Vec<String>,
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        end_date: Option<NaiveDate>,
        #[arg(long)]
        draft: bool,
    },
    AddService {
        slug: String,
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },
    AddTeamMember {
        name: String,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        photo: Option<String>,
        #[arg(long)]
        linked_in: Option<String>,
        #[arg(long)]
        display_order: Option<i64>,
    },
    ListContacts {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::AddProject {
            slug,
            title,
            summary,
            description,
            client,
            tags,
            cover_image,
            gallery,
            start_date,
            end_date,
            draft,
        } => {
            let project_id = storage
                .insert_project(&NewProject {
                    slug,
                    title,
                    summary,
                    description,
                    client,
                    tags,
                    cover_image_path: cover_image,
                    gallery_paths: gallery,
                    start_date,
                    end_date,
                    published: !draft,
                })
                .await?;
            println!("created project_id={project_id}");
        }
        Command::AddService {
            slug,
            name,
            description,
            icon,
        } => {
            let service_id = storage
                .insert_service(&NewService {
                    slug,
                    name,
                    description,
                    icon_path: icon,
                })
                .await?;
            println!("created service_id={service_id}");
        }
        Command::AddTeamMember {
            name,
            role,
            bio,
            photo,
            linked_in,
            display_order,
        } => {
            let member_id = storage
                .insert_team_member(&NewTeamMember {
                    name,
                    role,
                    bio,
                    photo_path: photo,
                    linked_in,
                    display_order,
                })
                .await?;
            println!("created team_member_id={member_id}");
        }
        Command::ListContacts { limit } => {
            for contact in storage.list_contacts(limit).await? {
                println!(
                    "{}  {}  {} <{}>{}",
                    contact.created_at.to_rfc3339(),
                    contact.id,
                    contact.name,
                    contact.email,
                    contact
                        .company
                        .as_deref()
                        .map(|company| format!(" ({company})"))
                        .unwrap_or_default()
                );
                println!("    {}", contact.message);
            }
        }
    }

    Ok(())
}
