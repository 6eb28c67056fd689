use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "Everrust")]
#[command(version = concat!(env!("VERGEN_GIT_BRANCH"), "/", env!("VERGEN_GIT_SHA")))]
#[command(about = "An open source game data archive explorer")]
pub struct CliArgs {
    #[arg(long, env = "EVERRUST_DATA_DIR", default_value_t = default_data_dir())]
    pub data_dir: String,

    #[arg(long, default_value = "enUS", env = "EVERRUST_LOCALE")]
    pub locale: String,

    #[arg(long, value_enum, default_value_t = GameVersion::WrathOfTheLichKing, env = "EVERRUST_GAME_VERSION")]
    pub game_version: GameVersion,

    /// main track gain for audio previews
    #[arg(long, default_value_t = 0.4, env = "EVERRUST_AUDIO_GAIN")]
    pub audio_gain: f32,

    #[command(subcommand)]
    pub operation_mode: OperationMode,
}

pub fn default_data_dir() -> String {
    std::env::current_dir()
        .expect("Can't read current working directory!")
        .join("_data")
        .to_string_lossy()
        .to_string()
}

#[derive(Subcommand, Debug)]
pub enum OperationMode {
    /// Print the installation's virtual file tree to stdout
    List {
        /// restrict the listing to paths starting with this prefix
        #[arg(long)]
        filter: Option<String>,
    },
    /// Open the explorer viewport, optionally previewing a file right away
    View {
        /// archive path of the file to preview, e.g. Creature\Chicken\Chicken.m2
        file: Option<String>,
    },
}

/// Decides format specifics during loading, e.g. where m2 skin profiles live.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameVersion {
    Vanilla,
    BurningCrusade,
    WrathOfTheLichKing,
}

// clap's default_value_t formats through Display
impl std::fmt::Display for GameVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GameVersion::Vanilla => "vanilla",
            GameVersion::BurningCrusade => "burning-crusade",
            GameVersion::WrathOfTheLichKing => "wrath-of-the-lich-king",
        };
        write!(f, "{}", name)
    }
}
