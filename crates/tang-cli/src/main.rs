use std::env;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use tang::{Language, Program, ProgramFlags as Flags};

const USAGE: &str = "\
Usage: tang [options] [filename]

Options:
  -e, --evaluate <code>  run the given string instead of reading a file
  -s, --script            evaluate as a script (default: template mode)
  -c, --cleanup           tear down all structures before exit
  -h, --help              print this message and exit

With no filename and no -e, the program is read from stdin.";

struct Args {
    source: Option<String>,
    evaluate: Option<String>,
    script_mode: bool,
    cleanup: bool,
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut evaluate = None;
    let mut script_mode = false;
    let mut cleanup = false;
    let mut filename = None;

    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-e" | "--evaluate" => {
                let code = iter.next().ok_or_else(|| format!("{arg} requires an argument"))?;
                evaluate = Some(code.clone());
            }
            "-s" | "--script" => script_mode = true,
            "-c" | "--cleanup" => cleanup = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(format!("unrecognized option '{other}'"));
            }
            other => {
                if filename.is_some() {
                    return Err(format!("unexpected extra argument '{other}'"));
                }
                filename = Some(other.to_string());
            }
        }
    }

    Ok(Args {
        source: filename,
        evaluate,
        script_mode,
        cleanup,
    })
}

fn read_source(args: &Args) -> io::Result<String> {
    if let Some(code) = &args.evaluate {
        return Ok(code.clone());
    }
    if let Some(path) = &args.source {
        return fs::read_to_string(path);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn main() -> ExitCode {
    let raw: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!("{USAGE}");
            return ExitCode::from(255);
        }
    };

    let source = match read_source(&args) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error reading input: {err}");
            return ExitCode::from(255);
        }
    };

    let language = Language::with_builtins();
    let flags = Flags {
        debug: false,
        duplicate_code: false,
        disable_bytecode: false,
        disable_binary: false,
    };

    let program = if args.script_mode {
        Program::create(&language, &source, flags)
    } else {
        Program::create_template(&language, &source, flags)
    };
    let program = match program {
        Ok(program) => program,
        Err(err) => {
            eprintln!("compile error: {err}");
            return ExitCode::from(1);
        }
    };

    if program.debug() {
        eprintln!("[debug] native backend available: {}", program.has_native());
    }

    let mut ctx = program.create_context();
    program.execute(&mut ctx);

    print!("{}", ctx.output);

    let is_error = ctx.result.is_error();
    let display = ctx.result.to_display_string(&ctx.gc);

    let exit_code = if is_error {
        eprintln!("runtime error: {display}");
        ExitCode::from(3)
    } else {
        ExitCode::SUCCESS
    };

    if args.cleanup {
        drop(ctx);
        drop(program);
        drop(language);
    }

    exit_code
}
