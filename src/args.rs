use clap::Parser;

/// Reads cast vote records (Clear Ballot format) and summarizes the initial vote transfers.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The contest configuration, in JSON format. It lists the candidates, the maximum
    /// number of rankings and the cast vote record files to read.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (directory path, 'stdout' or empty) Where to write the cast vote records and the transfers.
    /// Setting this option overrides the output directory that may be specified in the configuration.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the expected transfers in JSON format. If provided,
    /// rcvingest will check that its output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, a cast vote record file that cannot be opened stops the run.
    /// By default, such files are reported and the other files are still read.
    #[clap(long, takes_value = false)]
    pub strict: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
