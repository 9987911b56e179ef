//! Immutable per-command descriptors: argument schemas, options and where a
//! command may be used.

/// One declared argument or option.
#[derive(Clone, Debug)]
pub struct ArgSpec {
    pub name: &'static str,
    pub required: bool,
    /// Fixed literals must appear verbatim in the input and act as delimiters
    /// between free-text arguments.
    pub fixed: bool,
    pub description: &'static str,
    pub example: Option<&'static str>,
    /// For options only: the closed set of accepted values.
    pub one_of: Option<&'static [&'static str]>,
}

impl ArgSpec {
    pub fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            fixed: false,
            description: "",
            example: None,
            one_of: None,
        }
    }

    pub fn optional(name: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name)
        }
    }

    pub fn literal(name: &'static str) -> Self {
        Self {
            fixed: true,
            ..Self::required(name)
        }
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn example(mut self, example: &'static str) -> Self {
        self.example = Some(example);
        self
    }

    pub fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.one_of = Some(values);
        self
    }
}

/// Where a command may be invoked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoomPolicy {
    Allow,
    Deny,
    /// Allowed only in rooms whose name starts with the given prefix.
    NamePrefix(&'static str),
}

#[derive(Clone, Debug)]
pub struct UsageContext {
    pub dm: bool,
    pub room: RoomPolicy,
}

impl UsageContext {
    pub fn everywhere() -> Self {
        Self {
            dm: true,
            room: RoomPolicy::Allow,
        }
    }

    pub fn dm_only() -> Self {
        Self {
            dm: true,
            room: RoomPolicy::Deny,
        }
    }
}

/// Everything the dispatcher needs to know about a command besides its
/// handler. Built once at startup and never mutated.
#[derive(Clone, Debug)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub args: Vec<ArgSpec>,
    pub options: Vec<ArgSpec>,
    pub usage: UsageContext,
    /// When false, parse errors are passed to the handler instead of being
    /// reported by the dispatcher, letting the command phrase its own
    /// validation replies.
    pub auto_argument_error: bool,
}

impl CommandSpec {
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            args: Vec::new(),
            options: vec![ArgSpec::optional("help").describe("Display this help message")],
            usage: UsageContext::everywhere(),
            auto_argument_error: true,
        }
    }

    pub fn args(mut self, args: Vec<ArgSpec>) -> Self {
        debug_assert!(
            args.first().map(|a| !a.fixed).unwrap_or(true),
            "a leading fixed literal is not supported by the cursor walk"
        );
        self.args = args;
        self
    }

    pub fn options(mut self, options: Vec<ArgSpec>) -> Self {
        self.options = options;
        self
    }

    pub fn usage(mut self, usage: UsageContext) -> Self {
        self.usage = usage;
        self
    }

    pub fn manual_argument_errors(mut self) -> Self {
        self.auto_argument_error = false;
        self
    }

    /// `/name {arg} literal {arg}` shape, used in help listings.
    pub fn signature(&self) -> String {
        self.args
            .iter()
            .map(|arg| {
                if arg.fixed {
                    arg.name.to_string()
                } else {
                    format!("{{{}}}", arg.name)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Full `--help` text for this command.
    pub fn usage_text(&self, prefix: &str) -> String {
        let options = self
            .options
            .iter()
            .map(|option| match option.example {
                Some(example) => format!("--{}={example}", option.name),
                None => format!("--{}", option.name),
            })
            .collect::<Vec<_>>()
            .join(" ");

        let mut help = format!("{prefix}{} {} {options}\n", self.name, self.signature());
        if !self.args.is_empty() {
            help.push_str("- Arguments:\n");
            for arg in &self.args {
                help.push_str(&format!("  {} - {}\n", arg.name, arg.description));
            }
        }
        if !self.options.is_empty() {
            help.push_str("- Options:\n");
            for option in &self.options {
                help.push_str(&format!("  --{} - {}\n", option.name, option.description));
            }
        }
        help
    }
}
