use crate::model::fs::FSError;

/// One parsed line of the interactive shell.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Bye,
    Cd(String),
    Close,
    Delete(String),
    Get(String),
    Help,
    Lcd(String),
    Ls,
    Mdelete(Vec<String>),
    Mget(Vec<String>),
    Mkdir(String),
    Mput(Vec<String>),
    Open(String),
    Put(String),
    Pwd,
    Rmdir(String),
}

pub const HELP: &str = "\
bye | quit          end the session
cd <dir>            change the remote working directory
close               close the connection to the bucket
delete <file>       delete a remote file
get <file>          download a remote file into the local working directory
help                show this message
lcd <dir>           change the local working directory
ls                  list the remote working directory
mdelete <pat>...    delete remote files matching the patterns
mget <pat>...       download remote files matching the patterns
mkdir <dir>         create a remote directory
mput <pat>...       upload local files matching the patterns
open <location>     connect to s3://bucket[/dir], gs://bucket[/dir] or bucket[/dir]
put <file>          upload a local file into the remote working directory
pwd                 print the remote working directory
rmdir <dir>         remove an empty remote directory";

impl Command {
    /// Parses a line, returning `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Command>, FSError> {
        let mut tokens = line.split_whitespace();
        let verb = match tokens.next() {
            None => return Ok(None),
            Some(v) => v,
        };
        let args: Vec<String> = tokens.map(|t| t.to_string()).collect();

        let command = match verb {
            "bye" | "quit" => {
                no_args(verb, &args)?;
                Command::Bye
            }
            "close" => {
                no_args(verb, &args)?;
                Command::Close
            }
            "help" | "?" => {
                no_args(verb, &args)?;
                Command::Help
            }
            "ls" => {
                no_args(verb, &args)?;
                Command::Ls
            }
            "pwd" => {
                no_args(verb, &args)?;
                Command::Pwd
            }
            "cd" => Command::Cd(one_arg(verb, args)?),
            "delete" => Command::Delete(one_arg(verb, args)?),
            "get" => Command::Get(one_arg(verb, args)?),
            "lcd" => Command::Lcd(one_arg(verb, args)?),
            "mkdir" => Command::Mkdir(one_arg(verb, args)?),
            "open" => Command::Open(one_arg(verb, args)?),
            "put" => Command::Put(one_arg(verb, args)?),
            "rmdir" => Command::Rmdir(one_arg(verb, args)?),
            "mdelete" => Command::Mdelete(many_args(verb, args)?),
            "mget" => Command::Mget(many_args(verb, args)?),
            "mput" => Command::Mput(many_args(verb, args)?),
            _ => {
                return Err(FSError::InvalidCommand {
                    message: format!("unknown command `{}`", verb),
                })
            }
        };

        Ok(Some(command))
    }

    /// Whether the command can run without an open bucket.
    pub fn needs_connection(&self) -> bool {
        !matches!(
            self,
            Command::Bye | Command::Close | Command::Help | Command::Lcd(_) | Command::Open(_)
        )
    }
}

fn no_args(verb: &str, args: &[String]) -> Result<(), FSError> {
    if !args.is_empty() {
        return Err(FSError::InvalidCommand {
            message: format!("`{}` takes no arguments", verb),
        });
    }

    Ok(())
}

fn one_arg(verb: &str, mut args: Vec<String>) -> Result<String, FSError> {
    if args.len() != 1 {
        return Err(FSError::InvalidCommand {
            message: format!("`{}` takes exactly one argument", verb),
        });
    }

    Ok(args.remove(0))
}

fn many_args(verb: &str, args: Vec<String>) -> Result<Vec<String>, FSError> {
    if args.is_empty() {
        return Err(FSError::InvalidCommand {
            message: format!("`{}` needs at least one pattern", verb),
        });
    }

    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let cases = vec![
            ("", None),
            ("   ", None),
            ("ls", Some(Command::Ls)),
            ("quit", Some(Command::Bye)),
            ("bye", Some(Command::Bye)),
            ("  cd   a/b  ", Some(Command::Cd("a/b".to_string()))),
            ("open s3://bucket", Some(Command::Open("s3://bucket".to_string()))),
            (
                "mget *.txt a.*",
                Some(Command::Mget(vec!["*.txt".to_string(), "a.*".to_string()])),
            ),
            ("rmdir old", Some(Command::Rmdir("old".to_string()))),
        ];

        for (line, expected) in cases {
            let result = Command::parse(line).unwrap();
            assert_eq!(result, expected, "failed for case: {}", line);
        }
    }

    #[test]
    fn test_parse_invalid() {
        let cases = vec!["ls extra", "cd", "cd a b", "mput", "frobnicate x"];

        for line in cases {
            let result = Command::parse(line);
            assert!(
                matches!(result, Err(FSError::InvalidCommand { .. })),
                "failed for case: {}",
                line
            );
        }
    }

    #[test]
    fn test_needs_connection() {
        let cases = vec![
            (Command::Open("b".to_string()), false),
            (Command::Lcd("/tmp".to_string()), false),
            (Command::Bye, false),
            (Command::Close, false),
            (Command::Help, false),
            (Command::Ls, true),
            (Command::Pwd, true),
            (Command::Mput(vec!["*".to_string()]), true),
        ];

        for (command, expected) in cases {
            assert_eq!(
                command.needs_connection(),
                expected,
                "failed for case: {:?}",
                command
            );
        }
    }
}
