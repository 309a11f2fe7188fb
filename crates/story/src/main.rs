//! Command-line driver for the calloutpad editing core.
//!
//! Usage:
//!   calloutpad assist --text "I don't think it's cool." --prompt "make it formal"
//!   calloutpad commands list
//!   echo '{"text":"hi","prompt":"expand"}' | calloutpad transform
//!   calloutpad demo

mod render;

use std::io::Read as _;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use calloutpad_assist::{AssistManager, AssistState, RuleEngine, handle_json};
use calloutpad_core::{
    BlockKind, CommandPalette, DEFAULT_CATALOG, Document, EMPTY_MESSAGE, Editor, Node,
    PaletteKey, Selection, filter_commands,
};

#[derive(Parser, Debug)]
#[command(name = "calloutpad")]
#[command(about = "Callout-aware rich text editing core")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rewrite text with a prompt and show the suggested changes
    Assist {
        #[arg(long)]
        text: String,

        #[arg(long)]
        prompt: String,

        /// Show original and modified lines side by side
        #[arg(long)]
        split: bool,

        /// Apply the suggestion and print the resulting document
        #[arg(long)]
        apply: bool,
    },

    /// List slash commands matching a query
    Commands {
        #[arg(default_value = "")]
        query: String,
    },

    /// Serve one JSON transform request read from stdin
    Transform,

    /// Walk a document through the callout lifecycle
    Demo,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match Args::parse().command {
        Command::Assist {
            text,
            prompt,
            split,
            apply,
        } => assist(&text, &prompt, split, apply),
        Command::Commands { query } => {
            let items = filter_commands(&DEFAULT_CATALOG, &query);
            if items.is_empty() {
                println!("{}", EMPTY_MESSAGE);
            } else {
                print!("{}", render::commands(&items));
            }
            Ok(())
        }
        Command::Transform => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("reading request body")?;
            let (status, json) = handle_json(&RuleEngine::standard(), &body);
            println!("{status} {json}");
            Ok(())
        }
        Command::Demo => demo(),
    }
}

fn assist(text: &str, prompt: &str, split: bool, apply: bool) -> Result<()> {
    let mut editor = Editor::from_document(Document::new(vec![Node::paragraph(text)]));
    let end = editor.doc().content_size().saturating_sub(1);
    editor.set_selection(Selection::new(1, end));

    let mut manager = AssistManager::new(RuleEngine::standard());
    if !editor.trigger_assist() || !manager.process_requests(&mut editor) {
        bail!("nothing to rewrite");
    }

    match manager.submit(prompt)? {
        AssistState::Diff(diff) => {
            if split {
                print!("{}", render::split_diff(diff));
            } else {
                println!("{}", render::inline_diff(diff));
            }
            let stats = diff.stats();
            println!(
                "+{} -{} ={}",
                stats.added, stats.removed, stats.unchanged
            );
        }
        AssistState::Error(message) => bail!("{message}"),
        state => bail!("unexpected assist state: {}", state.name()),
    }

    if apply {
        manager.apply(&mut editor)?;
        println!("{}", editor.doc().plain_text());
    }
    Ok(())
}

fn demo() -> Result<()> {
    let mut editor = Editor::from_document(Document::new(vec![
        Node::heading(1, "Release notes"),
        Node::paragraph("/warn"),
    ]));
    let trigger_end = editor.doc().content_size() - 1;
    let trigger_start = trigger_end - "/warn".len();
    editor.set_selection(Selection::collapsed(trigger_end));

    let mut palette = CommandPalette::open(&DEFAULT_CATALOG, trigger_start..trigger_start + 1);
    palette.update(trigger_start..trigger_end, "warn");
    if !palette.handle_key(PaletteKey::Enter, &mut editor) {
        bail!("palette had nothing to apply");
    }
    let pos = editor.selection().head;
    editor.replace(pos..pos, "Back up your data first.")?;
    println!("after slash command:\n{}", render::outline(editor.doc()));

    let callout_start = editor
        .doc()
        .outline()
        .into_iter()
        .find(|block| block.kind == BlockKind::Callout)
        .map(|block| block.range.start)
        .context("callout missing")?;
    let retyped = editor.retype_callout(callout_start)?;
    println!("retyped to {}:\n{}", retyped.title(), render::outline(editor.doc()));

    if let Err(err) = editor.set_callout(retyped) {
        println!("nested callout refused: {err}");
    }

    editor.delete_callout(callout_start)?;
    println!("after delete:\n{}", render::outline(editor.doc()));

    editor.undo();
    println!("after undo:\n{}", render::outline(editor.doc()));
    Ok(())
}
