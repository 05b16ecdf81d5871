use morphy_reader::{FilesBundle, Morphy, MorphyError, MorphyOptions, StorageKind, WordGramInfo};
use std::env;

fn fail(message: &str) -> ! {
    eprintln!("ERROR: {}", message);
    std::process::exit(1);
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 5 {
        eprintln!(
            "Usage: {} <dict-dir> <lang> <base|all|grammar> <WORD>... \
             [--gramtab] [--predict-suffix] [--predict-db] [--mem] [--encoding <LABEL>] [--batch]",
            args[0]
        );
        std::process::exit(1);
    }

    let mut options = MorphyOptions::default();
    let mut batch = false;
    let mut positional: Vec<&str> = Vec::new();

    let mut iter = args[1..].iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--gramtab" => options.with_gramtab = true,
            "--predict-suffix" => options.predict_by_suffix = true,
            "--predict-db" => options.predict_by_db = true,
            "--mem" => options.storage = StorageKind::Mem,
            "--batch" => batch = true,
            "--encoding" => match iter.next() {
                Some(label) => options.encoding = Some(label.clone()),
                None => fail("--encoding flag requires an argument."),
            },
            flag if flag.starts_with("--") => fail(&format!("Unknown flag {}", flag)),
            word => positional.push(word),
        }
    }

    let [dir, lang, mode, words @ ..] = positional.as_slice() else {
        fail("Expected <dict-dir> <lang> <mode> <WORD>...");
    };
    if words.is_empty() {
        fail("No words given.");
    }

    let bundle = FilesBundle::new(dir, *lang);
    let morphy = match Morphy::open(&bundle, &options) {
        Ok(morphy) => morphy,
        Err(e) => {
            eprintln!("\nERROR: Failed to open dictionary in {}", dir);
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Dictionary: {} ({}), encoding {}",
        morphy.language(),
        morphy.codepage(),
        morphy.encoding().name()
    );
    println!("{}", "=".repeat(60));

    if let Err(e) = run(&morphy, mode, words, batch) {
        eprintln!("\nERROR: Lookup failed");
        eprintln!("  {}", e);
        std::process::exit(1);
    }
}

fn run(morphy: &Morphy, mode: &str, words: &[&str], batch: bool) -> Result<(), MorphyError> {
    match (mode, batch) {
        ("base" | "all", true) => {
            let result = if mode == "base" {
                morphy.base_form_batch(words)?
            } else {
                morphy.all_forms_batch(words)?
            };
            for (word, forms) in result {
                print_forms(&word, forms.as_deref());
            }
        }
        ("base" | "all", false) => {
            for word in words {
                let forms = if mode == "base" {
                    morphy.base_form(word)?
                } else {
                    morphy.all_forms(word)?
                };
                print_forms(word, forms.as_deref());
            }
        }
        ("grammar", true) => {
            for (word, infos) in morphy.all_forms_with_gram_info_batch(words)? {
                print_gram_info(&word, infos.as_deref());
            }
        }
        ("grammar", false) => {
            for word in words {
                print_gram_info(word, morphy.all_forms_with_gram_info(word)?.as_deref());
            }
        }
        _ => fail(&format!("Unknown mode '{}', expected base, all or grammar", mode)),
    }
    Ok(())
}

fn print_forms(word: &str, forms: Option<&[String]>) {
    match forms {
        Some(forms) => println!("{}: {}", word, forms.join(", ")),
        None => println!("{}: (not found)", word),
    }
}

fn print_gram_info(word: &str, infos: Option<&[WordGramInfo]>) {
    let Some(infos) = infos else {
        println!("{}: (not found)", word);
        return;
    };
    println!("{}:", word);
    for (i, info) in infos.iter().enumerate() {
        println!("  {}. [{}] {}", i + 1, info.common, info.all.join(" | "));
        println!("     {}", info.forms.join(", "));
    }
}
