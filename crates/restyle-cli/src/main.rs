//! Batch formatter: applies a script of selection and formatting commands
//! to a markup document.
//!
//! Offsets in scripts address the document's visible text (the concatenated
//! text leaves), not the raw markup, so scripts survive reformatting of the
//! surrounding structure.

use anyhow::{bail, Context, Result};
use clap::Parser;
use restyle_config::Config;
use restyle_engine::{
    BlockTag, BlockTarget, CustomTags, Editor, EditorOptions, FormatTag, HostSelection, ListTag,
    StyleDecl, StyleOp, StyleProperty,
};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "restyle")]
#[command(about = "Apply selection-based formatting commands to a markup document")]
struct Args {
    /// Document to edit; falls back to the configured default document
    document: Option<PathBuf>,

    /// Command script to run; read from stdin when omitted
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

/// One line of a formatting script.
#[derive(Debug, Clone, PartialEq)]
enum ScriptCommand {
    /// Select a text range by offsets into the document's visible text.
    Select { start: usize, end: usize },
    /// Place the caret at one visible-text offset.
    Caret { at: usize },
    Style(StyleOp),
    Block(BlockTarget),
    /// Delete the selected content; `force` also removes atomic elements.
    Delete { force: bool },
    Undo,
    Redo,
    InsertParagraph(String),
    /// Emit the current markup mid-script.
    Print,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    }
    .unwrap_or_default();

    let document_path = args
        .document
        .clone()
        .or_else(|| config.default_document.clone())
        .context("no document given and no default_document configured")?;
    let markup = std::fs::read_to_string(&document_path)
        .with_context(|| format!("failed to read {}", document_path.display()))?;

    let script = match &args.script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let mut editor = Editor::with_options(markup.trim(), options_from(&config))?;
    let printed = run_script(&mut editor, &script)?;
    for markup in printed {
        println!("{markup}");
    }

    match &args.output {
        Some(path) => std::fs::write(path, editor.markup())
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", editor.markup()),
    }
    Ok(())
}

fn options_from(config: &Config) -> EditorOptions {
    let custom_tags = if config.custom_tags.is_empty() {
        CustomTags::standard()
    } else {
        CustomTags::from_names(config.custom_tags.iter().map(String::as_str))
    };
    EditorOptions {
        custom_tags,
        history_size: config.history_size,
        debounce: Duration::from_millis(config.debounce_ms),
    }
}

/// Run every command in `script`, collecting mid-script `print` output.
fn run_script(editor: &mut Editor, script: &str) -> Result<Vec<String>> {
    let mut printed = Vec::new();
    for (number, line) in script.lines().enumerate() {
        if let Some(command) = parse_command(line)
            .with_context(|| format!("script line {}: {line:?}", number + 1))?
        {
            execute(editor, command, &mut printed)
                .with_context(|| format!("script line {}: {line:?}", number + 1))?;
        }
    }
    Ok(printed)
}

fn parse_command(line: &str) -> Result<Option<ScriptCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let head = words.next().unwrap_or_default();
    let command = match head {
        "select" => {
            let start = parse_offset(words.next())?;
            let end = parse_offset(words.next())?;
            ScriptCommand::Select { start, end }
        }
        "caret" => ScriptCommand::Caret {
            at: parse_offset(words.next())?,
        },
        "style" => ScriptCommand::Style(parse_style(words.next(), words.next())?),
        "unstyle" => {
            let name = words.next().context("unstyle needs a property name")?;
            let property = StyleProperty::from_name(name)
                .with_context(|| format!("unknown style property {name:?}"))?;
            ScriptCommand::Style(StyleOp::Remove(property))
        }
        "clear-styles" => ScriptCommand::Style(StyleOp::Clear),
        "block" => {
            let name = words.next().context("block needs a format name")?;
            ScriptCommand::Block(parse_block_target(name)?)
        }
        "clear-block" => ScriptCommand::Block(BlockTarget::Clear),
        "delete" => match words.next() {
            None => ScriptCommand::Delete { force: false },
            Some("force") => ScriptCommand::Delete { force: true },
            Some(other) => bail!("unknown delete argument {other:?}"),
        },
        "undo" => ScriptCommand::Undo,
        "redo" => ScriptCommand::Redo,
        "insert-paragraph" => {
            ScriptCommand::InsertParagraph(words.by_ref().collect::<Vec<_>>().join(" "))
        }
        "print" => ScriptCommand::Print,
        other => bail!("unknown command {other:?}"),
    };
    if words.next().is_some() {
        bail!("trailing arguments after {head:?}");
    }
    Ok(Some(command))
}

fn parse_offset(word: Option<&str>) -> Result<usize> {
    let word = word.context("missing text offset")?;
    word.parse()
        .with_context(|| format!("invalid text offset {word:?}"))
}

fn parse_style(name: Option<&str>, value: Option<&str>) -> Result<StyleOp> {
    let name = name.context("style needs a name")?;
    let decl = match (name, value) {
        ("bold", None) => StyleDecl::bold(),
        ("italic", None) => StyleDecl::italic(),
        ("underline", None) => StyleDecl::underline(),
        ("color", Some(value)) => StyleDecl::color(value),
        _ => bail!("unknown style {name:?}"),
    };
    Ok(StyleOp::Toggle(decl))
}

fn parse_block_target(name: &str) -> Result<BlockTarget> {
    if let Some(tag) = BlockTag::from_name(name) {
        return Ok(BlockTarget::Tag(FormatTag::Block(tag)));
    }
    if let Some(tag) = ListTag::from_name(name) {
        return Ok(BlockTarget::Tag(FormatTag::List(tag)));
    }
    bail!("unknown block format {name:?}")
}

fn execute(editor: &mut Editor, command: ScriptCommand, printed: &mut Vec<String>) -> Result<()> {
    match command {
        ScriptCommand::Select { start, end } => {
            let anchor = resolve_offset(editor, start)?;
            let focus = resolve_offset(editor, end)?;
            if !editor.set_selection(HostSelection::new(anchor, focus)) {
                bail!("selection rejected by the editor");
            }
        }
        ScriptCommand::Caret { at } => {
            let (node, offset) = resolve_offset(editor, at)?;
            if !editor.set_cursor(node, offset) {
                bail!("caret rejected by the editor");
            }
        }
        ScriptCommand::Style(op) => {
            if !editor.apply_inline_style(op) {
                bail!("style operation failed; select a non-empty text range first");
            }
        }
        ScriptCommand::Block(target) => {
            if !editor.apply_block_format(target) {
                bail!("block operation failed; select or place the caret first");
            }
        }
        ScriptCommand::Delete { force } => {
            if !editor.delete_selection(force) {
                bail!("delete failed; atomic elements need `delete force`");
            }
        }
        ScriptCommand::Undo => {
            if !editor.undo() {
                bail!("nothing to undo");
            }
        }
        ScriptCommand::Redo => {
            if !editor.redo() {
                bail!("nothing to redo");
            }
        }
        ScriptCommand::InsertParagraph(text) => {
            editor.insert_paragraph(&text);
        }
        ScriptCommand::Print => printed.push(editor.markup()),
    }
    Ok(())
}

fn resolve_offset(editor: &Editor, offset: usize) -> Result<(restyle_engine::NodeId, usize)> {
    let tree = editor.tree();
    tree.locate_text_offset(tree.root(), offset)
        .with_context(|| format!("text offset {offset} is past the end of the document"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_commands_and_skips_comments() {
        assert_eq!(parse_command("").unwrap(), None);
        assert_eq!(parse_command("# set up").unwrap(), None);
        assert_eq!(
            parse_command("select 6 11").unwrap(),
            Some(ScriptCommand::Select { start: 6, end: 11 })
        );
        assert_eq!(
            parse_command("style bold").unwrap(),
            Some(ScriptCommand::Style(StyleOp::Toggle(StyleDecl::bold())))
        );
        assert_eq!(
            parse_command("block ol").unwrap(),
            Some(ScriptCommand::Block(BlockTarget::Tag(FormatTag::List(
                ListTag::Ol
            ))))
        );
        assert!(parse_command("select 1").is_err());
        assert!(parse_command("block h7").is_err());
        assert!(parse_command("frobnicate").is_err());
    }

    #[test]
    fn script_styles_and_reformats() {
        let mut editor = Editor::from_markup("<p>Hello world</p>").unwrap();
        let script = "select 6 11\nstyle bold\ncaret 0\nblock h1\n";

        run_script(&mut editor, script).unwrap();

        assert_eq!(
            editor.markup(),
            "<h1>Hello <span style=\"font-weight:bold;\">world</span></h1>"
        );
    }

    #[test]
    fn print_captures_intermediate_states() {
        let mut editor = Editor::from_markup("<p>one</p>").unwrap();
        let script = "caret 0\nblock h2\nprint\nundo\n";

        let printed = run_script(&mut editor, script).unwrap();

        assert_eq!(printed, vec!["<h2>one</h2>".to_string()]);
        assert_eq!(editor.markup(), "<p>one</p>");
    }

    #[test]
    fn delete_needs_force_over_atomic_elements() {
        let mut editor =
            Editor::from_markup("<p>aa <x-link href=\"u\" id=\"l\">x</x-link> bb</p>").unwrap();

        let err = run_script(&mut editor, "select 1 4\ndelete\n").unwrap_err();
        assert!(format!("{err:#}").contains("delete force"));

        run_script(&mut editor, "delete force\n").unwrap();
        assert_eq!(editor.markup(), "<p>abb</p>");
    }

    #[test]
    fn offsets_past_the_document_end_are_rejected() {
        let mut editor = Editor::from_markup("<p>one</p>").unwrap();

        let err = run_script(&mut editor, "select 0 99\n").unwrap_err();
        assert!(format!("{err:#}").contains("past the end"));

        // The end of the visible text itself is still addressable.
        run_script(&mut editor, "select 0 3\nblock h1\n").unwrap();
        assert_eq!(editor.markup(), "<h1>one</h1>");
    }

    #[test]
    fn errors_carry_the_line_number() {
        let mut editor = Editor::from_markup("<p>one</p>").unwrap();
        let err = run_script(&mut editor, "caret 0\nstyle bold\n").unwrap_err();

        assert!(format!("{err:#}").contains("line 2"));
    }
}
