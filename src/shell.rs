use std::io::{self, BufRead, Write};

use tracing::{debug, info, span, Level};

use crate::{
    fs::ObjectFS,
    ftp::BatchReport,
    model::{
        command::{Command, HELP},
        fs::FSError,
    },
};

/// What a command produced, for the loop to print.
#[derive(Debug)]
pub enum Output {
    Nothing,
    Lines(Vec<String>),
    Batch(BatchReport),
    Quit,
}

pub fn execute(fs: &mut ObjectFS, command: Command) -> Result<Output, FSError> {
    debug!(command = ?command, "execute");

    if command.needs_connection() && !fs.session.is_open() {
        return Err(FSError::NotConnected);
    }

    let output = match command {
        Command::Bye => Output::Quit,
        Command::Cd(dir) => {
            fs.cd(&dir)?;
            Output::Nothing
        }
        Command::Close => {
            fs.close();
            Output::Nothing
        }
        Command::Delete(file) => {
            fs.delete(&file)?;
            Output::Nothing
        }
        Command::Get(file) => {
            fs.get(&file, None)?;
            Output::Nothing
        }
        Command::Help => Output::Lines(HELP.lines().map(str::to_string).collect()),
        Command::Lcd(dir) => {
            fs.lcd(&dir)?;
            Output::Nothing
        }
        Command::Ls => Output::Lines(fs.ls()?),
        Command::Mdelete(patterns) => Output::Batch(fs.mdelete(&patterns)?),
        Command::Mget(patterns) => Output::Batch(fs.mget(&patterns, None)?),
        Command::Mkdir(dir) => {
            fs.mkdir(&dir)?;
            Output::Nothing
        }
        Command::Mput(patterns) => Output::Batch(fs.mput(&patterns, None)?),
        Command::Open(location) => {
            fs.open(&location)?;
            Output::Nothing
        }
        Command::Put(file) => {
            fs.put(&file, None)?;
            Output::Nothing
        }
        Command::Pwd => Output::Lines(vec![fs.pwd()?]),
        Command::Rmdir(dir) => {
            fs.rmdir(&dir)?;
            Output::Nothing
        }
    };

    Ok(output)
}

/// Reads commands line by line until `bye`/`quit` or end of input.
///
/// Command failures are written to `err` as one line each and never end
/// the loop; only I/O errors on the streams themselves do.
pub fn run<R, W, E>(fs: &mut ObjectFS, input: R, mut out: W, mut err: E) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    let span = span!(Level::INFO, "shell", context = "shell");
    let _e = span.enter();
    info!("called");

    for line in input.lines() {
        let line = line?;

        let res = Command::parse(&line).and_then(|command| match command {
            None => Ok(Output::Nothing),
            Some(command) => execute(fs, command),
        });

        match res {
            Err(e) => writeln!(err, "Error: {}", e)?,
            Ok(Output::Quit) => break,
            Ok(Output::Nothing) => {}
            Ok(Output::Lines(lines)) => {
                for line in lines {
                    writeln!(out, "{}", line)?;
                }
            }
            Ok(Output::Batch(report)) => {
                for (name, res) in report {
                    if let Err(e) = res {
                        writeln!(err, "Error: {}: {}", name, e)?;
                    }
                }
            }
        }

        out.flush()?;
    }

    info!("exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, path::PathBuf};

    use super::*;
    use crate::{adapters::mock::MockClient, fs::mock_fs};

    fn run_script(fs: &mut ObjectFS, script: &str) -> (String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        run(fs, Cursor::new(script), &mut out, &mut err).unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_session_script() {
        let client = MockClient::with_bucket("bucket");
        client.insert("bucket", "readme.txt", 3);
        let mut fs = mock_fs(&client, "", PathBuf::from("/tmp"));

        let (out, err) = run_script(
            &mut fs,
            "mkdir docs\n\ncd docs\npwd\ncd ..\nls\nrmdir docs\nls\n",
        );

        assert_eq!(out, "bucket/docs\ndocs\nreadme.txt\nreadme.txt\n");
        assert_eq!(err, "");
    }

    #[test]
    fn test_errors_do_not_stop_the_loop() {
        let client = MockClient::with_bucket("bucket");
        client.insert("bucket", "d/", 0);
        client.insert("bucket", "d/f", 1);
        let mut fs = mock_fs(&client, "", PathBuf::from("/tmp"));

        let (out, err) = run_script(&mut fs, "rmdir d\nfrobnicate\ndelete d\ncd nowhere\npwd\n");

        assert_eq!(out, "bucket/\n");
        assert_eq!(
            err,
            "Error: directory is not empty: d\n\
             Error: invalid command: unknown command `frobnicate`\n\
             Error: is a directory: d\n\
             Error: no such directory: nowhere\n"
        );
    }

    #[test]
    fn test_bye_stops_reading() {
        let client = MockClient::with_bucket("bucket");
        let mut fs = mock_fs(&client, "", PathBuf::from("/tmp"));

        let (out, _) = run_script(&mut fs, "pwd\nquit\npwd\n");

        assert_eq!(out, "bucket/\n");
    }

    #[test]
    fn test_requires_connection() {
        let client = MockClient::with_bucket("bucket");
        let mut fs = mock_fs(&client, "", PathBuf::from("/tmp"));

        let (out, err) = run_script(&mut fs, "close\nls\nopen bucket\nls\n");

        assert_eq!(out, "");
        assert_eq!(
            err,
            "Error: not connected, use `open <location>` first\n"
        );
    }

    #[test]
    fn test_batch_failures_reported_per_file() {
        let local = tempfile::tempdir().unwrap();
        let client = MockClient::with_bucket("bucket");
        client.insert("bucket", "a.txt", 1);
        client.insert("bucket", "b.txt/", 0);
        let mut fs = mock_fs(&client, "", local.path().to_path_buf());

        let (_, err) = run_script(&mut fs, "mget *.txt\n");

        assert_eq!(err, "Error: b.txt: is a directory: b.txt\n");
        assert!(local.path().join("a.txt").exists());
    }

    #[test]
    fn test_help() {
        let client = MockClient::with_bucket("bucket");
        let mut fs = mock_fs(&client, "", PathBuf::from("/tmp"));
        fs.close();

        let (out, err) = run_script(&mut fs, "help\n");

        assert_eq!(err, "");
        assert!(out.lines().any(|l| l.starts_with("mget <pat>...")));
    }
}
