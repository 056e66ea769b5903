use gumdrop::Options;

/// Mirror git repositories, updating them on HTTP requests and GitHub webhooks.
#[derive(Debug, Options)]
pub struct Args {
    /// The working directory, containing the mirrors and the global hooks in bin/.
    #[options(default = "/tmp")]
    pub dir: String,

    /// The path to the git executable.
    #[options(default = "/usr/bin/git")]
    pub git: String,

    /// The address to listen on.
    #[options(default = "0.0.0.0:8124")]
    pub addr: String,

    /// Optional secret for authenticating GitHub webhooks.
    #[options()]
    pub secret: Option<String>,

    /// The clone URL of public repositories, {} is replaced with the full name.
    #[options(no_short, default = "https://github.com/{}.git")]
    pub public_url: String,

    /// The clone URL of private repositories, {} is replaced with the full name.
    #[options(no_short, default = "git@github.com:{}.git")]
    pub private_url: String,

    /// Increase verbosity, can be set multiple times (-v debug, -vv tracing)
    #[options(count)]
    pub verbose: u8,

    /// Only print error messages.
    #[options()]
    pub quiet: bool,

    /// Print the current version.
    #[options(short = "V")]
    pub version: bool,

    /// Print this help.
    #[options()]
    pub help: bool,
}

pub fn parse_args() -> Args {
    Args::parse_args_default_or_exit()
}
