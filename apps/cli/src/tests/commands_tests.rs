use super::*;
use clap::CommandFactory;

fn parse(line: &str) -> ShellCommand {
    ShellLine::try_parse_from(split_line(line))
        .expect("shell line")
        .command
}

#[test]
fn split_line_keeps_quoted_runs() {
    assert_eq!(
        split_line(r#"update-profile --name "Ada Lovelace" --email 'a@b.c'"#),
        ["update-profile", "--name", "Ada Lovelace", "--email", "a@b.c"]
    );
    assert_eq!(split_line("   "), Vec::<String>::new());
    assert_eq!(split_line(r#"send """#), ["send", ""]);
}

#[test]
fn shell_accepts_client_commands() {
    assert_eq!(
        parse("send -c 10 hello   there"),
        ShellCommand::Client(Command::Send {
            channel: Some("10".into()),
            image: None,
            text: vec!["hello".into(), "there".into()],
        })
    );
    assert_eq!(
        parse("open 11 --private"),
        ShellCommand::Client(Command::Open {
            channel: "11".into(),
            private: true,
            public: false,
        })
    );
    assert_eq!(
        parse("open 11"),
        ShellCommand::Client(Command::Open {
            channel: "11".into(),
            private: false,
            public: false,
        })
    );
    assert!(ShellLine::try_parse_from(split_line("open 11 --private --public")).is_err());
    assert_eq!(
        parse("invite -c 12 2 3"),
        ShellCommand::Client(Command::Invite {
            channel: Some("12".into()),
            users: vec!["2".into(), "3".into()],
        })
    );
}

#[test]
fn shell_only_commands_parse() {
    assert_eq!(
        parse("view data:image/png;base64,AAA"),
        ShellCommand::View {
            url: "data:image/png;base64,AAA".into()
        }
    );
    assert_eq!(parse("next-image"), ShellCommand::NextImage);
    assert_eq!(parse("prev-image"), ShellCommand::PrevImage);
    assert_eq!(parse("exit"), ShellCommand::Exit);
}

#[test]
fn edit_message_requires_text() {
    assert!(ShellLine::try_parse_from(split_line("edit-message 100")).is_err());
}

#[test]
fn channel_flag_help_explains_the_shell_default() {
    let shell = ShellLine::command();
    for name in ["react", "pin", "delete-message", "edit-message", "messages"] {
        let subcommand = shell.find_subcommand(name).expect("subcommand");
        let channel = subcommand
            .get_arguments()
            .find(|arg| arg.get_id() == "channel")
            .expect("channel flag");
        let help = channel.get_help().map(ToString::to_string).unwrap_or_default();
        assert!(help.contains("last opened in the shell"), "{name}: {help}");
    }
}
