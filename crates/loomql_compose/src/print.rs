//! SDL rendering.
//!
//! Renders a folded graph back to schema definition language. Built-in
//! scalars and directives are skipped; everything else comes out in
//! declaration order, so rendering is stable across runs and across
//! re-parsing its own output.

use indexmap::IndexMap;

use crate::graph::{
    DirectiveEntry, EnumEntry, FieldEntry, InputFieldEntry, InputObjectEntry, TypeEntry,
    TypeGraph, UnionEntry,
};

/// Renders the graph as SDL, one block per declaration.
pub fn render(graph: &TypeGraph) -> String {
    let mut blocks: Vec<String> = Vec::new();

    if graph.schema_location.is_some() {
        let mut block = String::from("schema {\n");
        if let Some(query) = &graph.query_type {
            block.push_str(&format!("  query: {query}\n"));
        }
        if let Some(mutation) = &graph.mutation_type {
            block.push_str(&format!("  mutation: {mutation}\n"));
        }
        if let Some(subscription) = &graph.subscription_type {
            block.push_str(&format!("  subscription: {subscription}\n"));
        }
        block.push('}');
        blocks.push(block);
    }

    for (_, directive) in graph.directives() {
        if directive.builtin {
            continue;
        }
        blocks.push(render_directive(directive));
    }

    for (_, entry) in graph.types() {
        if let TypeEntry::Scalar(scalar) = entry {
            if scalar.builtin {
                continue;
            }
        }
        blocks.push(render_type(entry));
    }

    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

fn render_type(entry: &TypeEntry) -> String {
    match entry {
        TypeEntry::Scalar(scalar) => {
            let mut out = String::new();
            description(&mut out, scalar.description.as_deref(), "");
            out.push_str("scalar ");
            out.push_str(&scalar.name);
            out
        }
        TypeEntry::Object(obj) => object_like(
            "type",
            &obj.name,
            obj.description.as_deref(),
            &obj.implements,
            &obj.fields,
        ),
        TypeEntry::Interface(iface) => object_like(
            "interface",
            &iface.name,
            iface.description.as_deref(),
            &iface.implements,
            &iface.fields,
        ),
        TypeEntry::Union(un) => render_union(un),
        TypeEntry::Enum(en) => render_enum(en),
        TypeEntry::InputObject(input) => render_input(input),
    }
}

fn object_like(
    keyword: &str,
    name: &str,
    desc: Option<&str>,
    implements: &[String],
    fields: &IndexMap<String, FieldEntry>,
) -> String {
    let mut out = String::new();
    description(&mut out, desc, "");
    out.push_str(keyword);
    out.push(' ');
    out.push_str(name);
    if !implements.is_empty() {
        out.push_str(" implements ");
        out.push_str(&implements.join(" & "));
    }
    if !fields.is_empty() {
        out.push_str(" {\n");
        for field in fields.values() {
            render_field(&mut out, field);
        }
        out.push('}');
    }
    out
}

fn render_field(out: &mut String, field: &FieldEntry) {
    description(out, field.description.as_deref(), "  ");
    out.push_str("  ");
    out.push_str(&field.name);
    out.push_str(&render_arguments(&field.arguments));
    out.push_str(": ");
    out.push_str(&field.ty.to_string());
    deprecated(out, field.deprecated, field.deprecation_reason.as_deref());
    out.push('\n');
}

fn render_arguments(arguments: &IndexMap<String, InputFieldEntry>) -> String {
    if arguments.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = arguments.values().map(input_field).collect();
    format!("({})", parts.join(", "))
}

fn input_field(field: &InputFieldEntry) -> String {
    let mut out = format!("{}: {}", field.name, field.ty);
    if let Some(default) = &field.default_value {
        out.push_str(" = ");
        out.push_str(default);
    }
    out
}

fn render_union(un: &UnionEntry) -> String {
    let mut out = String::new();
    description(&mut out, un.description.as_deref(), "");
    out.push_str("union ");
    out.push_str(&un.name);
    if !un.members.is_empty() {
        out.push_str(" = ");
        out.push_str(&un.members.join(" | "));
    }
    out
}

fn render_enum(en: &EnumEntry) -> String {
    let mut out = String::new();
    description(&mut out, en.description.as_deref(), "");
    out.push_str("enum ");
    out.push_str(&en.name);
    if !en.values.is_empty() {
        out.push_str(" {\n");
        for value in en.values.values() {
            description(&mut out, value.description.as_deref(), "  ");
            out.push_str("  ");
            out.push_str(&value.name);
            deprecated(&mut out, value.deprecated, value.deprecation_reason.as_deref());
            out.push('\n');
        }
        out.push('}');
    }
    out
}

fn render_input(input: &InputObjectEntry) -> String {
    let mut out = String::new();
    description(&mut out, input.description.as_deref(), "");
    out.push_str("input ");
    out.push_str(&input.name);
    if !input.fields.is_empty() {
        out.push_str(" {\n");
        for field in input.fields.values() {
            description(&mut out, field.description.as_deref(), "  ");
            out.push_str("  ");
            out.push_str(&input_field(field));
            out.push('\n');
        }
        out.push('}');
    }
    out
}

fn render_directive(directive: &DirectiveEntry) -> String {
    let mut out = String::new();
    description(&mut out, directive.description.as_deref(), "");
    out.push_str("directive @");
    out.push_str(&directive.name);
    out.push_str(&render_arguments(&directive.arguments));
    if directive.repeatable {
        out.push_str(" repeatable");
    }
    out.push_str(" on ");
    let locations: Vec<&str> = directive.locations.iter().map(|l| l.as_str()).collect();
    out.push_str(&locations.join(" | "));
    out
}

fn description(out: &mut String, text: Option<&str>, indent: &str) {
    let Some(text) = text else { return };
    let escaped = text.replace("\"\"\"", "\\\"\"\"");
    // The compact form cannot end in a quote: the closer would read as
    // four quotes in a row.
    if escaped.contains('\n') || escaped.ends_with('"') {
        out.push_str(indent);
        out.push_str("\"\"\"\n");
        for line in escaped.lines() {
            out.push_str(indent);
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(indent);
        out.push_str("\"\"\"\n");
    } else {
        out.push_str(indent);
        out.push_str(&format!("\"\"\"{escaped}\"\"\"\n"));
    }
}

fn deprecated(out: &mut String, flag: bool, reason: Option<&str>) {
    if !flag {
        return;
    }
    match reason {
        Some(reason) => out.push_str(&format!(" @deprecated(reason: {reason:?})")),
        None => out.push_str(" @deprecated"),
    }
}
