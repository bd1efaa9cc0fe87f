use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use mergemind_core_sdk::{
    config::Settings,
    conversation::Termination,
    models::ProviderKind,
    pipeline::{self, SolutionRequest},
    server, telemetry,
};

/**
 * \brief CLI 程序入口：本地服务或一次性问答。
 */
#[derive(Parser, Debug)]
#[command(
    name = "mergemind",
    version,
    about = "Ask two models, let a referee merge the answers"
)]
struct Cli {
    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Commands,
}

/**
 * \brief 会话运行参数，覆盖环境变量中的配置。
 */
#[derive(Args, Debug)]
struct RunArgs {
    /// Maximum number of messages in the conversation, question included
    #[arg(long, global = true)]
    round_limit: Option<usize>,

    /// Which message may end the conversation: any | referee
    #[arg(long, global = true)]
    termination: Option<Termination>,

    /// Enable telemetry logging
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /**
     * \brief 启动本地 HTTP 服务并提供前端页面。
     */
    Serve {
        #[arg(long, default_value = "127.0.0.1:7860")]
        addr: String,
    },

    /**
     * \brief 提交一个编程问题并打印裁判给出的最终答案。
     */
    Ask {
        #[arg(long)]
        question: String,
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, default_value = "")]
        openai_key: String,
        #[arg(long, default_value = ProviderKind::OpenAI.default_model())]
        openai_model: String,
        #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, default_value = "")]
        gemini_key: String,
        #[arg(long, default_value = ProviderKind::Gemini.default_model())]
        gemini_model: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.run.verbose);

    let mut settings = Settings::from_env();
    if let Some(limit) = cli.run.round_limit {
        settings.round_limit = limit;
    }
    if let Some(termination) = cli.run.termination {
        settings.termination = termination;
    }
    tracing::debug!(?settings, "settings resolved");

    match cli.command {
        Commands::Serve { addr } => {
            server::run(&addr, settings)
                .await
                .with_context(|| format!("serve on {} failed", addr))?;
        }
        Commands::Ask {
            question,
            openai_key,
            openai_model,
            gemini_key,
            gemini_model,
        } => {
            let req = SolutionRequest {
                question,
                openai_key,
                openai_model,
                gemini_key,
                gemini_model,
            };
            let output = pipeline::generate_solution(&req, &settings).await;
            println!("{}", output);
        }
    }

    Ok(())
}
