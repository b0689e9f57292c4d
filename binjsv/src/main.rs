use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::process;

use libjsv::Template;
use serde_json::Value;

const USAGE: &str = "\
Usage: jsv [OPTIONS] [FILE]

Encode or decode line-separated JSON records against a JSV template.
Reads FILE, or standard input if FILE is omitted. Blank lines are
skipped.

Options:
  -t, --template <TEMPLATE>  the template to code records against
  -e, --encode               encode JSON records to JSV
  -d, --decode               decode JSV records to JSON (the default)
  -c, --canonical            print the canonical template text and exit
  -i, --infer                print the template inferred from each JSON line
  -h, --help                 print this message
  -V, --version              print the version
";

#[derive(Clone, Copy)]
enum Mode {
    Encode,
    Decode,
    Canonical,
    Infer,
}

fn main() {
    let mut template_text: Option<String> = None;
    let mut mode: Option<Mode> = None;
    let mut path: Option<String> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-t" | "--template" => match args.next() {
                Some(text) => template_text = Some(text),
                None => fail("missing argument for --template"),
            },
            "-e" | "--encode" => mode = Some(Mode::Encode),
            "-d" | "--decode" => mode = Some(Mode::Decode),
            "-c" | "--canonical" => mode = Some(Mode::Canonical),
            "-i" | "--infer" => mode = Some(Mode::Infer),
            "-h" | "--help" => {
                print!("{}", USAGE);
                return;
            }
            "-V" | "--version" => {
                println!("jsv {}", env!("CARGO_PKG_VERSION"));
                return;
            }
            _ if arg.starts_with('-') => fail(&format!("unrecognized option {}", arg)),
            _ => {
                if path.is_some() {
                    fail("too many input files");
                }
                path = Some(arg);
            }
        }
    }

    match mode.unwrap_or(Mode::Decode) {
        Mode::Infer => for_each_line(path, |line_no, line| {
            match serde_json::from_str::<Value>(line) {
                Ok(sample) => println!("{}", Template::from_value(&sample)),
                Err(err) => fail(&format!("line {}: {}", line_no, err)),
            }
        }),
        Mode::Canonical => {
            println!("{}", compile_template(template_text));
        }
        Mode::Encode => {
            let template = compile_template(template_text);
            for_each_line(path, |line_no, line| {
                let record: Value = match serde_json::from_str(line) {
                    Ok(record) => record,
                    Err(err) => fail(&format!("line {}: {}", line_no, err)),
                };
                match template.encode(&record) {
                    Ok(encoded) => println!("{}", encoded),
                    Err(err) => fail(&format!("line {}: {}", line_no, err)),
                }
            });
        }
        Mode::Decode => {
            let template = compile_template(template_text);
            for_each_line(path, |line_no, line| match template.decode(line) {
                Ok(value) => println!("{}", value),
                Err(err) => fail(&format!("line {}: {}", line_no, err)),
            });
        }
    }
}

fn compile_template(text: Option<String>) -> Template {
    let Some(text) = text else {
        fail("a template is required; pass -t <TEMPLATE>");
    };
    match Template::compile(&text) {
        Ok(template) => template,
        Err(err) => fail(&format!("template: {}", err)),
    }
}

fn for_each_line<F: FnMut(usize, &str)>(path: Option<String>, mut handle: F) {
    let reader: Box<dyn BufRead> = match path {
        Some(path) => match File::open(&path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(err) => fail(&format!("{}: {}", path, err)),
        },
        None => Box::new(BufReader::new(io::stdin())),
    };
    for (index, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => fail(&format!("read: {}", err)),
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        handle(index + 1, trimmed);
    }
}

fn fail(message: &str) -> ! {
    eprintln!("jsv: {}", message);
    process::exit(1);
}
