//! Line-oriented driver for a session over an in-memory scene.
//!
//! Each line is one command. Scene-building commands (`mesh`, `group`, `select`, ...) work at any
//! time, stack commands need a session opened with `open`. Everything after a `#` is ignored.

use modstack_core::{
    scene::{MemoryScene, SceneGraph},
    session::{self, Session},
    Config,
};

#[derive(
    Copy, Clone, PartialEq, Eq, Hash, Debug, strum::EnumString, strum::EnumIter, strum::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum Verb {
    Mesh,
    Group,
    Procedure,
    Fail,
    Select,
    Ls,
    Open,
    Add,
    Up,
    Down,
    Activate,
    #[strum(to_string = "vis")]
    Visibility,
    #[strum(to_string = "int")]
    Interact,
    Toggle,
    Reset,
    Remove,
    Stack,
    Stacks,
    List,
    Update,
    State,
    Help,
}
impl Verb {
    #[must_use]
    pub fn usage(self) -> &'static str {
        match self {
            Self::Mesh => "mesh <name> [shader]: add a mesh",
            Self::Group => "group <name> [parent]: add an empty transform",
            Self::Procedure => "procedure <name>: register a duplication procedure",
            Self::Fail => "fail <procedure> <reason>: make a procedure fail",
            Self::Select => "select [names...]: replace the scene selection",
            Self::Ls => "ls <pattern>: list objects matching a name or wildcard",
            Self::Open => "open [object]: open the object's stack, creating it if needed",
            Self::Add => "add [object]: add a layer copied from the object or selection",
            Self::Up => "up [count]: activate a higher layer",
            Self::Down => "down [count]: activate a lower layer",
            Self::Activate => "activate <layer>: activate a layer of the open stack",
            Self::Visibility => "vis: toggle visibility of the inactive layers",
            Self::Interact => "int: toggle interactivity of the inactive layers",
            Self::Toggle => "toggle [layer]: reapply shared state, inverting the active layer",
            Self::Reset => "reset: show every layer",
            Self::Remove => "remove: delete the active layer",
            Self::Stack => "stack <next|prev|name>: switch stacks",
            Self::Stacks => "stacks: list stacks",
            Self::List => "list: list layers of the open stack",
            Self::Update => "update: reapply the shared state to every layer, then list them",
            Self::State => "state: show the active stack, layer and shared state",
            Self::Help => "help: show this",
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum StackTarget {
    Next,
    Prev,
    Named(String),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Command {
    Mesh {
        name: String,
        shader: Option<String>,
    },
    Group {
        name: String,
        parent: Option<String>,
    },
    Procedure(String),
    Fail {
        procedure: String,
        reason: String,
    },
    Select(Vec<String>),
    Ls(String),
    Open(Option<String>),
    Add(Option<String>),
    /// Move the active layer by an offset, up being positive.
    Move(isize),
    Activate(String),
    ToggleVisibility,
    ToggleInteractivity,
    ToggleModes(Option<String>),
    Reset,
    Remove,
    Stack(StackTarget),
    Stacks,
    List,
    Update,
    State,
    Help,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command {0:?}, try `help`")]
    UnknownVerb(String),
    #[error("`{0}` needs {1}")]
    MissingArgument(Verb, &'static str),
    #[error("`{0}` takes at most {1} argument(s)")]
    TooManyArguments(Verb, usize),
    #[error("{0:?} is not a count")]
    BadCount(String),
}

#[derive(thiserror::Error, Debug)]
#[error("no stack is open, use `open` first")]
pub struct NotOpen;

struct Args<'a> {
    verb: Verb,
    words: Vec<&'a str>,
}
impl Args<'_> {
    fn at_most(&self, count: usize) -> Result<(), ParseError> {
        if self.words.len() > count {
            Err(ParseError::TooManyArguments(self.verb, count))
        } else {
            Ok(())
        }
    }
    fn optional(&self, index: usize) -> Option<String> {
        self.words.get(index).map(|&word| word.to_owned())
    }
    fn required(&self, index: usize, what: &'static str) -> Result<String, ParseError> {
        self.optional(index)
            .ok_or(ParseError::MissingArgument(self.verb, what))
    }
    fn count(&self) -> Result<isize, ParseError> {
        self.at_most(1)?;
        let Some(&word) = self.words.first() else {
            return Ok(1);
        };
        word.parse::<usize>()
            .ok()
            .and_then(|count| isize::try_from(count).ok())
            .ok_or_else(|| ParseError::BadCount(word.to_owned()))
    }
}

/// Parse one line. Blank lines and comments give `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.split('#').next().unwrap_or_default();
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let verb: Verb = verb
        .parse()
        .map_err(|_| ParseError::UnknownVerb(verb.to_owned()))?;
    let args = Args {
        verb,
        words: words.collect(),
    };

    let command = match verb {
        Verb::Mesh => {
            args.at_most(2)?;
            Command::Mesh {
                name: args.required(0, "a name")?,
                shader: args.optional(1),
            }
        }
        Verb::Group => {
            args.at_most(2)?;
            Command::Group {
                name: args.required(0, "a name")?,
                parent: args.optional(1),
            }
        }
        Verb::Procedure => {
            args.at_most(1)?;
            Command::Procedure(args.required(0, "a procedure name")?)
        }
        Verb::Fail => Command::Fail {
            procedure: args.required(0, "a procedure name")?,
            reason: args
                .words
                .get(1..)
                .filter(|reason| !reason.is_empty())
                .ok_or(ParseError::MissingArgument(verb, "a reason"))?
                .join(" "),
        },
        Verb::Select => Command::Select(args.words.iter().map(|&word| word.to_owned()).collect()),
        Verb::Ls => {
            args.at_most(1)?;
            Command::Ls(args.required(0, "a pattern")?)
        }
        Verb::Open => {
            args.at_most(1)?;
            Command::Open(args.optional(0))
        }
        Verb::Add => {
            args.at_most(1)?;
            Command::Add(args.optional(0))
        }
        Verb::Up => Command::Move(args.count()?),
        Verb::Down => Command::Move(-args.count()?),
        Verb::Activate => {
            args.at_most(1)?;
            Command::Activate(args.required(0, "a layer")?)
        }
        Verb::Toggle => {
            args.at_most(1)?;
            Command::ToggleModes(args.optional(0))
        }
        Verb::Stack => {
            args.at_most(1)?;
            Command::Stack(match args.required(0, "next, prev or a stack")?.as_str() {
                "next" => StackTarget::Next,
                "prev" => StackTarget::Prev,
                name => StackTarget::Named(name.to_owned()),
            })
        }
        Verb::Visibility
        | Verb::Interact
        | Verb::Reset
        | Verb::Remove
        | Verb::Stacks
        | Verb::List
        | Verb::Update
        | Verb::State
        | Verb::Help => {
            args.at_most(0)?;
            match verb {
                Verb::Visibility => Command::ToggleVisibility,
                Verb::Interact => Command::ToggleInteractivity,
                Verb::Reset => Command::Reset,
                Verb::Remove => Command::Remove,
                Verb::Stacks => Command::Stacks,
                Verb::List => Command::List,
                Verb::Update => Command::Update,
                Verb::State => Command::State,
                _ => Command::Help,
            }
        }
    };
    Ok(Some(command))
}

enum State {
    /// Building the scene, no stack open yet.
    Idle(MemoryScene),
    Open(Session<MemoryScene>),
}

pub struct Console {
    config: Config,
    state: State,
}
impl Console {
    /// An empty scene that knows the configured duplication procedure.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut scene = MemoryScene::new(config.naming.reference_suffix.clone());
        scene.register_procedure(config.duplication.procedure.clone());
        Self {
            config,
            state: State::Idle(scene),
        }
    }
    #[must_use]
    pub fn scene(&self) -> &MemoryScene {
        match &self.state {
            State::Idle(scene) => scene,
            State::Open(session) => session.scene(),
        }
    }
    fn scene_mut(&mut self) -> &mut MemoryScene {
        match &mut self.state {
            State::Idle(scene) => scene,
            State::Open(session) => session.scene_mut(),
        }
    }
    fn session(&mut self) -> Result<&mut Session<MemoryScene>, NotOpen> {
        match &mut self.state {
            State::Open(session) => Ok(session),
            State::Idle(_) => Err(NotOpen),
        }
    }
    /// Open (or switch to) the stack of `object`, or of the selected object.
    fn open(&mut self, object: Option<String>) -> anyhow::Result<String> {
        let selection = object.map_or_else(|| self.scene().selection(), |object| vec![object]);
        let selection: Vec<&str> = selection.iter().map(String::as_str).collect();

        let state = std::mem::replace(&mut self.state, State::Idle(MemoryScene::default()));
        let (state, opened) = match state {
            State::Open(mut session) => {
                let opened = match selection.as_slice() {
                    [one] => session.retarget(one).map(|_| ()),
                    other => Err(session::Error::SelectionArity(other.len())),
                };
                (State::Open(session), opened)
            }
            State::Idle(scene) => match Session::new(scene, self.config.clone(), &selection) {
                Ok(session) => (State::Open(session), Ok(())),
                Err(e) => {
                    let (error, scene) = e.into_parts();
                    (State::Idle(scene), Err(error))
                }
            },
        };
        self.state = state;
        opened?;

        let session = self.session()?;
        Ok(format!(
            "stack {}, layer {}",
            session.active_stack(),
            session.active_layer()
        ))
    }
    fn list(&mut self) -> anyhow::Result<String> {
        let session = self.session()?;
        let mut lines = Vec::new();
        for layer in session.layers()? {
            let state = session.applied_state(&layer)?;
            let marker = if layer == session.active_layer() { '*' } else { ' ' };
            lines.push(format!(
                "{marker} {layer} (visible: {}, interactive: {})",
                state.visible, state.interactive
            ));
        }
        Ok(lines.join("\n"))
    }
    /// Run one command, returning what to report back.
    pub fn execute(&mut self, command: Command) -> anyhow::Result<String> {
        log::trace!("{command:?}");
        let reply = match command {
            Command::Mesh { name, shader } => {
                let name = self.scene_mut().add_mesh(&name, shader.as_deref());
                format!("added {name}")
            }
            Command::Group { name, parent } => {
                let name = self.scene_mut().add_transform(&name, parent.as_deref())?;
                format!("added {name}")
            }
            Command::Procedure(name) => {
                self.scene_mut().register_procedure(name.clone());
                format!("registered {name}")
            }
            Command::Fail { procedure, reason } => {
                self.scene_mut().fail_procedure(procedure.clone(), reason);
                format!("{procedure} will fail")
            }
            Command::Select(names) => {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                self.scene_mut().select(&names)?;
                format!("selected {names:?}")
            }
            Command::Ls(pattern) => self.scene().ls(&pattern)?.join("\n"),
            Command::Open(object) => self.open(object)?,
            Command::Add(object) => {
                let layer = self.session()?.add_layer(object.as_deref())?;
                format!("added {layer}")
            }
            Command::Move(offset) => {
                let layer = self.session()?.move_relative(offset)?;
                format!("active {layer}")
            }
            Command::Activate(layer) => {
                self.session()?.activate_layer(&layer)?;
                format!("active {layer}")
            }
            Command::ToggleVisibility => {
                let visible = self.session()?.toggle_visibility()?;
                format!("inactive layers visible: {visible}")
            }
            Command::ToggleInteractivity => {
                let interactive = self.session()?.toggle_interactivity()?;
                format!("inactive layers interactive: {interactive}")
            }
            Command::ToggleModes(layer) => {
                self.session()?.toggle_modes(layer.as_deref())?;
                "toggled".to_owned()
            }
            Command::Reset => {
                let session = self.session()?;
                session.reset_modes()?;
                format!("reset {}", session.active_stack())
            }
            Command::Remove => {
                let layer = self.session()?.remove_active_layer()?;
                format!("removed, active {layer}")
            }
            Command::Stack(target) => {
                let session = self.session()?;
                let stack = match target {
                    StackTarget::Next => session.move_stack_relative(1)?,
                    StackTarget::Prev => session.move_stack_relative(-1)?,
                    StackTarget::Named(stack) => {
                        session.activate_stack(&stack)?;
                        stack
                    }
                };
                format!("active stack {stack}")
            }
            Command::Stacks => self.session()?.stacks()?.join("\n"),
            Command::List => self.list()?,
            Command::Update => {
                self.session()?.sync_all(None)?;
                self.list()?
            }
            Command::State => {
                let session = self.session()?;
                let shared = session.shared_state();
                format!(
                    "stack {}, layer {}, inactive layers visible: {}, interactive: {}",
                    session.active_stack(),
                    session.active_layer(),
                    shared.visible,
                    shared.interactive
                )
            }
            Command::Help => <Verb as strum::IntoEnumIterator>::iter()
                .map(Verb::usage)
                .collect::<Vec<_>>()
                .join("\n"),
        };
        Ok(reply)
    }
    /// Execute every line of `input`, reporting to `output`. Failed commands are reported and
    /// skipped. Returns the number of failures.
    pub fn run(
        &mut self,
        input: impl std::io::BufRead,
        mut output: impl std::io::Write,
        prompt: bool,
    ) -> anyhow::Result<usize> {
        let mut failures = 0;
        let mut lines = input.lines();
        loop {
            if prompt {
                write!(output, "> ")?;
                output.flush()?;
            }
            let Some(line) = lines.next() else {
                break;
            };
            let result = match parse_line(&line?) {
                Ok(None) => continue,
                Ok(Some(command)) => self.execute(command),
                Err(e) => Err(e.into()),
            };
            match result {
                Ok(reply) if reply.is_empty() => (),
                Ok(reply) => writeln!(output, "{reply}")?,
                Err(e) => {
                    failures += 1;
                    log::debug!("command failed: {e:?}");
                    writeln!(output, "error: {e:#}")?;
                }
            }
        }
        Ok(failures)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn run(console: &mut Console, script: &str) -> (String, usize) {
        let mut output = Vec::new();
        let failures = console.run(script.as_bytes(), &mut output, false).unwrap();
        (String::from_utf8(output).unwrap(), failures)
    }

    #[test]
    fn parse() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# just a comment").unwrap(), None);
        assert_eq!(parse_line("up").unwrap(), Some(Command::Move(1)));
        assert_eq!(parse_line("down 2 # twice").unwrap(), Some(Command::Move(-2)));
        assert_eq!(parse_line("add").unwrap(), Some(Command::Add(None)));
        assert_eq!(
            parse_line("add Cube1_ModLayer01").unwrap(),
            Some(Command::Add(Some("Cube1_ModLayer01".to_owned())))
        );
        assert_eq!(parse_line("list").unwrap(), Some(Command::List));
        assert_eq!(parse_line("update").unwrap(), Some(Command::Update));
        assert_eq!(parse_line("vis").unwrap(), Some(Command::ToggleVisibility));
        assert_eq!(
            parse_line("stack prev").unwrap(),
            Some(Command::Stack(StackTarget::Prev))
        );
        assert_eq!(
            parse_line("fail dup out of memory").unwrap(),
            Some(Command::Fail {
                procedure: "dup".to_owned(),
                reason: "out of memory".to_owned()
            })
        );
    }
    #[test]
    fn parse_errors() {
        assert_eq!(
            parse_line("frobnicate"),
            Err(ParseError::UnknownVerb("frobnicate".to_owned()))
        );
        assert_eq!(
            parse_line("activate"),
            Err(ParseError::MissingArgument(Verb::Activate, "a layer"))
        );
        assert_eq!(
            parse_line("reset now"),
            Err(ParseError::TooManyArguments(Verb::Reset, 0))
        );
        assert_eq!(
            parse_line("up -1"),
            Err(ParseError::BadCount("-1".to_owned()))
        );
        assert!(matches!(
            parse_line("fail dup"),
            Err(ParseError::MissingArgument(Verb::Fail, _))
        ));
    }
    #[test]
    fn needs_a_session() {
        let mut console = Console::new(Config::default());
        assert!(console.execute(Command::List).is_err());
        // Scene edits work before opening.
        assert_eq!(
            console
                .execute(Command::Mesh {
                    name: "Cube1".to_owned(),
                    shader: None
                })
                .unwrap(),
            "added Cube1"
        );
    }
    #[test]
    fn failed_open_keeps_the_scene() {
        let mut console = Console::new(Config::default());
        let (output, failures) = run(&mut console, "mesh Cube1\nopen\nopen Cube1");
        assert_eq!(failures, 1);
        assert!(output.contains("error: expected exactly one selected object, found 0"));
        assert!(output.ends_with("stack Cube1_ModStack, layer Cube1_ModLayer00\n"));
    }
    #[test]
    fn script() {
        let mut console = Console::new(Config::default());
        let (output, failures) = run(
            &mut console,
            "
            mesh Cube1 blinn1
            select Cube1
            open
            add
            add
            down
            vis
            down
            down  # past the bottom
            list
            ",
        );
        assert_eq!(failures, 1);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            [
                "added Cube1",
                "selected [\"Cube1\"]",
                "stack Cube1_ModStack, layer Cube1_ModLayer00",
                "added Cube1_ModLayer01",
                "added Cube1_ModLayer02",
                "active Cube1_ModLayer01",
                "inactive layers visible: false",
                "active Cube1_ModLayer00",
                "error: nothing at offset -1 from \"Cube1_ModLayer00\"",
                "* Cube1_ModLayer00 (visible: true, interactive: true)",
                "  Cube1_ModLayer01 (visible: false, interactive: true)",
                "  Cube1_ModLayer02 (visible: false, interactive: true)",
            ]
        );
    }
    #[test]
    fn update_restores_drifted_layers() {
        let mut console = Console::new(Config::default());
        let (_, failures) = run(&mut console, "mesh Cube1\nopen Cube1\nadd Cube1\nadd Cube1");
        assert_eq!(failures, 0);
        console
            .scene_mut()
            .set_visibility("Cube1_ModLayer00", false)
            .unwrap();

        let (output, failures) = run(&mut console, "list\nupdate");
        assert_eq!(failures, 0);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "  Cube1_ModLayer00 (visible: false, interactive: true)");
        assert_eq!(
            lines[3..],
            [
                "  Cube1_ModLayer00 (visible: true, interactive: true)",
                "  Cube1_ModLayer01 (visible: true, interactive: true)",
                "* Cube1_ModLayer02 (visible: true, interactive: true)",
            ]
        );
    }
    #[test]
    fn switching_stacks() {
        let mut console = Console::new(Config::default());
        let (output, failures) = run(
            &mut console,
            "
            mesh Cube1
            mesh Sphere
            open Cube1
            open Sphere
            stacks
            stack prev
            stack next
            stack next
            ",
        );
        assert_eq!(failures, 1);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines[3..],
            [
                "stack Sphere_ModStack, layer Sphere_ModLayer00",
                "Cube1_ModStack",
                "Sphere_ModStack",
                "active stack Cube1_ModStack",
                "active stack Sphere_ModStack",
                "error: nothing at offset 1 from \"Sphere_ModStack\"",
            ]
        );
    }
}
