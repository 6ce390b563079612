use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use spai_client::auth::{AuthSuccess, RegistrationForm};
use spai_client::client::ApiError;
use spai_client::config::{load_config, schema_json, ConfigError};
use spai_client::features::ChatClient;
use spai_client::models::{
    ChatMessage, ItineraryQuery, RecipeQuery, SaveChat, SaveRecipe, SaveTravel, SavedRecipe,
    SavedTravel,
};
use spai_client::startup::build_context;
use spai_client::state::ClientContext;
use spai_client::utils::logger::init_logging;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),
    #[error("could not render output: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "spai", version, about = "Travel, chat and recipe assistant client")]
struct Cli {
    /// Configuration file; missing files fall back to defaults.
    #[arg(long, env = "SPAI_CONFIG", default_value = "spai.yaml", global = true)]
    config: PathBuf,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the configuration JSON schema.
    Schema,
    Login {
        username_or_email: String,
        #[arg(long, env = "SPAI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: String,
        #[arg(long, env = "SPAI_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, env = "SPAI_CONFIRM_PASSWORD", hide_env_values = true)]
        confirm_password: String,
    },
    Logout,
    Whoami,
    /// Count saved trips, recipes and chat messages.
    Stats,
    Travel(TravelCommand),
    Chat(ChatCommand),
    Recipe(RecipeCommand),
}

#[derive(Args, Debug)]
struct TravelCommand {
    #[command(subcommand)]
    command: TravelSubcommand,
}

#[derive(Subcommand, Debug)]
enum TravelSubcommand {
    Plan {
        destination: String,
        #[arg(long, default_value_t = 3)]
        days: u32,
        #[arg(long)]
        interests: Option<String>,
        #[arg(long)]
        budget: Option<String>,
        /// Save the generated itinerary under this trip name.
        #[arg(long)]
        save_as: Option<String>,
    },
    List,
    Show {
        id: i64,
    },
    Search {
        destination: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        interests: Option<String>,
        #[arg(long)]
        budget: Option<String>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug)]
struct ChatCommand {
    #[command(subcommand)]
    command: ChatSubcommand,
}

#[derive(Subcommand, Debug)]
enum ChatSubcommand {
    Ask {
        prompt: String,
        /// Save the exchange to history.
        #[arg(long)]
        save: bool,
        /// Conversation to save into; implies --save.
        #[arg(long)]
        session: Option<String>,
    },
    Options {
        prompt: String,
    },
    History {
        #[arg(long)]
        session: Option<String>,
    },
    Session {
        id: String,
    },
    /// Print a fresh conversation id.
    NewSession,
    Clear,
}

#[derive(Args, Debug)]
struct RecipeCommand {
    #[command(subcommand)]
    command: RecipeSubcommand,
}

#[derive(Subcommand, Debug)]
enum RecipeSubcommand {
    Generate {
        ingredients: String,
        #[arg(long)]
        cuisine: Option<String>,
        #[arg(long)]
        diet: Option<String>,
        /// Save the generated recipe under this name.
        #[arg(long)]
        save_as: Option<String>,
    },
    Suggest {
        ingredients: String,
    },
    List,
    Show {
        id: i64,
    },
    Delete {
        id: i64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if let CliError::Api(api_error) = &e {
                if api_error.requires_login() {
                    eprintln!("Run `spai login` to sign in again.");
                }
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Command::Schema = cli.command {
        println!("{}", schema_json()?);
        return Ok(());
    }

    let config = load_config(&cli.config)?;
    init_logging(&config.logging)?;
    debug!(config = ?config, "configuration loaded");

    let context = build_context(Arc::new(config)).await?;
    let out = Output { json: cli.json };

    match cli.command {
        Command::Schema => Ok(()),
        Command::Login {
            username_or_email,
            password,
        } => {
            let success = context.auth.login(&username_or_email, &password).await?;
            print_welcome(&success);
            Ok(())
        }
        Command::Register {
            username,
            email,
            full_name,
            password,
            confirm_password,
        } => {
            let registration = RegistrationForm {
                full_name,
                username,
                email,
                password,
                confirm_password,
            }
            .validate()?;
            let success = context.auth.register(&registration).await?;
            print_welcome(&success);
            Ok(())
        }
        Command::Logout => {
            context.auth.logout().await;
            println!("Logged out.");
            Ok(())
        }
        Command::Whoami => {
            match context.auth.current_profile().await {
                Some(profile) => out.print(&profile, |p| match &p.email {
                    Some(email) => format!("{} <{}>", p.username, email),
                    None => p.username.clone(),
                })?,
                None => println!("Not logged in."),
            }
            Ok(())
        }
        Command::Stats => stats(&context, &out).await,
        Command::Travel(cmd) => travel(&context, &out, cmd.command).await,
        Command::Chat(cmd) => chat(&context, &out, cmd.command).await,
        Command::Recipe(cmd) => recipe(&context, &out, cmd.command).await,
    }
}

fn print_welcome(success: &AuthSuccess) {
    if let Some(message) = &success.message {
        println!("{}", message);
    }
    println!("Logged in as {}.", success.profile.username);
}

struct Output {
    json: bool,
}

impl Output {
    fn print<T: Serialize>(&self, value: &T, text: impl FnOnce(&T) -> String) -> Result<(), CliError> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text(value));
        }
        Ok(())
    }

    fn print_message(&self, message: Option<String>, fallback: &str) {
        println!("{}", message.unwrap_or_else(|| fallback.to_string()));
    }
}

/// Cancelled when the user presses Ctrl-C, so a long generation can be
/// abandoned without killing the process mid-write.
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    token
}

/// Run a follow-up request, giving up as soon as `interrupt` is cancelled.
/// Once `interrupt_token` has installed its handler Ctrl-C no longer stops
/// the process, so every later request in the same command goes through here.
async fn unless_interrupted<T>(
    interrupt: &CancellationToken,
    request: impl std::future::Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    if interrupt.is_cancelled() {
        return Err(ApiError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = interrupt.cancelled() => Err(ApiError::Cancelled),
        result = request => result,
    }
}

fn trip_line(trip: &SavedTravel) -> String {
    format!(
        "#{:<5} {} ({} days) {} {}",
        trip.id,
        trip.destination,
        trip.days,
        trip.saved_at.format("%Y-%m-%d %H:%M"),
        trip.trip_name.as_deref().unwrap_or("")
    )
}

fn recipe_line(recipe: &SavedRecipe) -> String {
    format!(
        "#{:<5} {} [{}] {}",
        recipe.id,
        recipe.recipe_name.as_deref().unwrap_or("Untitled recipe"),
        recipe.ingredients,
        recipe.saved_at.format("%Y-%m-%d %H:%M")
    )
}

fn chat_lines(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| {
            format!(
                "[{}] you: {}\n      ai: {}",
                m.timestamp.format("%Y-%m-%d %H:%M"),
                m.user_message,
                m.ai_response
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct Stats {
    trips: usize,
    recipes: usize,
    chat_messages: usize,
}

async fn stats(context: &ClientContext, out: &Output) -> Result<(), CliError> {
    let api = &context.api;
    let (travel, recipes, chat) = (api.travel(), api.recipes(), api.chat());
    let (trips, saved_recipes, history) =
        tokio::join!(travel.list_saved(), recipes.list_saved(), chat.history(None));
    let stats = Stats {
        trips: trips?.len(),
        recipes: saved_recipes?.len(),
        chat_messages: history?.len(),
    };
    out.print(&stats, |s| {
        format!(
            "Trips: {}\nRecipes: {}\nChat messages: {}",
            s.trips, s.recipes, s.chat_messages
        )
    })
}

async fn travel(context: &ClientContext, out: &Output, command: TravelSubcommand) -> Result<(), CliError> {
    let travel = context.api.travel();
    match command {
        TravelSubcommand::Plan {
            destination,
            days,
            interests,
            budget,
            save_as,
        } => {
            let query = ItineraryQuery {
                destination,
                days,
                interests,
                budget,
            };
            let interrupt = interrupt_token();
            let itinerary = travel.itinerary_cancellable(&query, &interrupt).await?;
            println!("{}", itinerary);
            if let Some(trip_name) = save_as {
                let body = SaveTravel {
                    destination: Some(query.destination),
                    days: Some(query.days),
                    interests: query.interests,
                    budget: query.budget,
                    itinerary_text: Some(itinerary),
                    trip_name: Some(trip_name),
                };
                let saved = unless_interrupted(&interrupt, travel.save(&body)).await?;
                println!("Saved as #{}.", saved.id);
            }
            Ok(())
        }
        TravelSubcommand::List => {
            let trips = travel.list_saved().await?;
            out.print(&trips, |t| t.iter().map(trip_line).collect::<Vec<_>>().join("\n"))
        }
        TravelSubcommand::Show { id } => {
            let trip = travel.get_saved(id).await?;
            out.print(&trip, |t| format!("{}\n\n{}", trip_line(t), t.itinerary_text))
        }
        TravelSubcommand::Search { destination } => {
            let trips = travel.search_saved(&destination).await?;
            out.print(&trips, |t| t.iter().map(trip_line).collect::<Vec<_>>().join("\n"))
        }
        TravelSubcommand::Update {
            id,
            name,
            days,
            interests,
            budget,
        } => {
            let changes = SaveTravel {
                trip_name: name,
                days,
                interests,
                budget,
                ..Default::default()
            };
            let trip = travel.update_saved(id, &changes).await?;
            out.print(&trip, trip_line)
        }
        TravelSubcommand::Delete { id } => {
            let message = travel.delete_saved(id).await?;
            out.print_message(message, "Itinerary deleted.");
            Ok(())
        }
    }
}

async fn chat(context: &ClientContext, out: &Output, command: ChatSubcommand) -> Result<(), CliError> {
    let chat = context.api.chat();
    match command {
        ChatSubcommand::Ask {
            prompt,
            save,
            session,
        } => {
            let interrupt = interrupt_token();
            let answer = chat.ask_cancellable(&prompt, &interrupt).await?;
            println!("{}", answer);
            if save || session.is_some() {
                let body = SaveChat {
                    prompt,
                    ai_response: Some(answer),
                    session_id: session,
                };
                let saved = unless_interrupted(&interrupt, chat.save(&body)).await?;
                debug!(id = saved.id, "chat message saved");
            }
            Ok(())
        }
        ChatSubcommand::Options { prompt } => {
            println!("{}", chat.options(&prompt).await?);
            Ok(())
        }
        ChatSubcommand::History { session } => {
            let messages = chat.history(session.as_deref()).await?;
            out.print(&messages, |m| chat_lines(m))
        }
        ChatSubcommand::Session { id } => {
            let messages = chat.session(&id).await?;
            out.print(&messages, |m| chat_lines(m))
        }
        ChatSubcommand::NewSession => {
            println!("{}", ChatClient::new_session_id());
            Ok(())
        }
        ChatSubcommand::Clear => {
            let message = chat.clear_history().await?;
            out.print_message(message, "Chat history cleared.");
            Ok(())
        }
    }
}

async fn recipe(context: &ClientContext, out: &Output, command: RecipeSubcommand) -> Result<(), CliError> {
    let recipes = context.api.recipes();
    match command {
        RecipeSubcommand::Generate {
            ingredients,
            cuisine,
            diet,
            save_as,
        } => {
            let query = RecipeQuery {
                ingredients,
                cuisine,
                dietary_restrictions: diet,
            };
            let interrupt = interrupt_token();
            let text = recipes.generate_cancellable(&query, &interrupt).await?;
            println!("{}", text);
            if let Some(recipe_name) = save_as {
                let body = SaveRecipe {
                    recipe_text: text,
                    ingredients: query.ingredients,
                    cuisine: query.cuisine,
                    dietary_restrictions: query.dietary_restrictions,
                    recipe_name: Some(recipe_name),
                };
                let saved = unless_interrupted(&interrupt, recipes.save(&body)).await?;
                println!("Saved as #{}.", saved.id);
            }
            Ok(())
        }
        RecipeSubcommand::Suggest { ingredients } => {
            println!("{}", recipes.suggestions(&ingredients).await?);
            Ok(())
        }
        RecipeSubcommand::List => {
            let saved = recipes.list_saved().await?;
            out.print(&saved, |r| r.iter().map(recipe_line).collect::<Vec<_>>().join("\n"))
        }
        RecipeSubcommand::Show { id } => {
            let recipe = recipes.get_saved(id).await?;
            out.print(&recipe, |r| format!("{}\n\n{}", recipe_line(r), r.recipe_text))
        }
        RecipeSubcommand::Delete { id } => {
            let message = recipes.delete_saved(id).await?;
            out.print_message(message, "Recipe deleted.");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_flag_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["spai", "travel", "list", "--config", "x.yaml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("x.yaml"));
    }

    #[tokio::test]
    async fn test_interrupted_follow_up_is_not_sent() {
        let interrupt = CancellationToken::new();
        interrupt.cancel();
        let mut sent = false;
        let result = unless_interrupted(&interrupt, async {
            sent = true;
            Ok::<_, ApiError>(())
        })
        .await;
        assert!(matches!(result, Err(ApiError::Cancelled)));
        assert!(!sent);
    }

    #[tokio::test]
    async fn test_interrupt_abandons_pending_follow_up() {
        let interrupt = CancellationToken::new();
        let trigger = interrupt.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let result = unless_interrupted(&interrupt, std::future::pending::<Result<(), ApiError>>()).await;
        assert!(matches!(result, Err(ApiError::Cancelled)));
    }

    #[tokio::test]
    async fn test_uninterrupted_follow_up_returns_its_result() {
        let result = unless_interrupted(&CancellationToken::new(), async { Ok::<_, ApiError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
