//! cyro CLI entry point
//!
//! - `cyro ask <message>` - route one message and print the reply
//! - `cyro chat` - read messages from stdin until `exit`
//! - `cyro agents` - list registered agents
//! - `cyro tools` - list tool categories and archetypes
//! - `cyro config` - print the effective settings

use anyhow::Context;
use cyro::agents::{AgentHandle, Route, RoutePath, Router, RouterBuilder};
use cyro::cli::output::Output;
use cyro::cli::{Cli, Commands};
use cyro::{CyroError, CyroSettings, OpenAiCompatibleProvider, ToolFactory};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn setup_logging(verbose: bool, json: bool) {
    let default = if verbose {
        "cyro=debug,cyro_tools=debug"
    } else {
        "cyro=info,cyro_tools=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    setup_logging(cli.verbose, cli.log_json);
    let no_color = cli.no_color;

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Output::with_color(!no_color).error(&format!("{:#}", e));
            let code = e.downcast_ref::<CyroError>().map_or(1, CyroError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = CyroSettings::load(cli.config.as_deref())?;
    if let Some(model) = &cli.model {
        settings.provider.model = model.clone();
    }
    settings.verbose |= cli.verbose;
    let output = Output::with_color(settings.color_output && !cli.no_color);

    match cli.command {
        Commands::Config => {
            let rendered = settings.to_toml().context("Failed to render settings")?;
            print!("{}", rendered);
            Ok(())
        }
        Commands::Tools => {
            print_tools(&settings, &output);
            Ok(())
        }
        Commands::Agents => {
            let router = build_router(&settings, &cli.agents_dir)?;
            print_agents(&router, &output, settings.verbose);
            Ok(())
        }
        Commands::Ask {
            message,
            agent,
            explain,
        } => {
            let router = build_router(&settings, &cli.agents_dir)?;
            let pinned = pinned_agent(&router, agent, &settings)?;
            let reply = answer(&router, pinned.as_ref(), &message, explain, &output).await?;
            output.reply(&reply);
            Ok(())
        }
        Commands::Chat { agent } => {
            let router = build_router(&settings, &cli.agents_dir)?;
            let pinned = pinned_agent(&router, agent, &settings)?;
            chat(&router, pinned.as_ref(), settings.verbose, &output).await
        }
    }
}

fn build_router(
    settings: &CyroSettings,
    agents_dir: &Option<std::path::PathBuf>,
) -> anyhow::Result<Router> {
    let provider = Arc::new(OpenAiCompatibleProvider::new(settings.provider.clone())?);
    let mut builder = RouterBuilder::new(settings.clone(), provider);
    if let Some(dir) = agents_dir {
        builder = builder.agents_dir(dir);
    }
    Ok(builder.build()?)
}

/// The agent named on the command line, else the configured default unless it is `auto`
fn pinned_agent(
    router: &Router,
    requested: Option<String>,
    settings: &CyroSettings,
) -> anyhow::Result<Option<Arc<AgentHandle>>> {
    let name = requested.or_else(|| {
        (!settings.default_agent.eq_ignore_ascii_case("auto"))
            .then(|| settings.default_agent.clone())
    });
    match name {
        Some(name) => Ok(Some(router.get_agent_by_name(&name)?)),
        None => Ok(None),
    }
}

async fn answer(
    router: &Router,
    pinned: Option<&Arc<AgentHandle>>,
    message: &str,
    explain: bool,
    output: &Output,
) -> cyro::Result<String> {
    let agent = match pinned {
        Some(agent) => {
            if explain {
                output.routing(agent.metadata().name(), "(requested)");
            }
            Arc::clone(agent)
        }
        None => {
            let route = router.route(message).await?;
            if explain {
                explain_route(&route, output);
            }
            route.agent
        }
    };
    agent.respond_async(message).await
}

fn explain_route(route: &Route, output: &Output) {
    let detail = match &route.path {
        RoutePath::Shortcut => "(only agent)".to_string(),
        RoutePath::Selected(selection) => format!("(selected: {})", selection.reasoning),
        RoutePath::Fallback(reason) => format!("(fallback: {})", reason),
    };
    output.routing(route.agent.metadata().name(), &detail);
}

async fn chat(
    router: &Router,
    pinned: Option<&Arc<AgentHandle>>,
    verbose: bool,
    output: &Output,
) -> anyhow::Result<()> {
    output.banner(pinned.map(|a| a.metadata().name()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        output.prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if matches!(message, "exit" | "quit") {
            break;
        }

        match answer(router, pinned, message, verbose, output).await {
            Ok(reply) => output.reply(&reply),
            Err(e) => output.error(&e.to_string()),
        }
    }
    Ok(())
}

fn print_agents(router: &Router, output: &Output, verbose: bool) {
    output.header("Agents");
    output.table_header(&["Name", "Version", "Model", "Tools"]);
    for agent in router.registry() {
        let tools = agent
            .config()
            .tools
            .as_ref()
            .map(|t| t.join(","))
            .unwrap_or_else(|| "-".to_string());
        output.table_row(&[
            agent.metadata().name(),
            agent.metadata().version(),
            agent.model_name(),
            tools.as_str(),
        ]);
        if verbose {
            output.kv("id", &agent.id().to_string());
            output.kv("description", agent.metadata().description());
            output.kv("tools", &agent.tools().names().join(", "));
        }
    }

    let report = router.load_report();
    for skipped in &report.skipped {
        output.warning(&format!("Skipped {}: {}", skipped.path.display(), skipped.error));
    }
    if report.synthesized_default {
        output.hint("general-engineer is built in. Add *.md files to the agents directory to define more agents.");
    }
}

fn print_tools(settings: &CyroSettings, output: &Output) {
    let factory = ToolFactory::new(settings.tool_context());

    output.header("Tool Categories");
    for category in factory.available_categories() {
        let names = factory
            .build(&[category.as_str()])
            .map(|bundle| bundle.names().join(", "))
            .unwrap_or_default();
        let label = if settings.security.require_approval.contains(&category) {
            format!("{} (requires approval)", category)
        } else {
            category.clone()
        };
        output.kv(&label, &names);
    }

    output.subheader("Archetypes");
    for archetype in factory.available_archetypes() {
        let categories = ToolFactory::archetype_categories(&archetype)
            .unwrap_or_default()
            .join(", ");
        let categories = if categories.is_empty() {
            "(none)".to_string()
        } else {
            categories
        };
        output.kv(&archetype, &categories);
    }
}
