use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Store a task example and print its id
    Store {
        /// Task description
        #[arg(short, long)]
        task: String,

        /// Known-good solution or trajectory
        #[arg(short, long)]
        solution: String,

        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Find stored examples relevant to a task description
    Find {
        query: String,

        #[arg(long, default_value = "3")]
        num: usize,

        #[arg(short, long)]
        min_score: Option<f32>,
    },

    /// Show the selected backend and how many examples it holds
    Backend,
}
