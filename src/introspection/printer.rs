use colored::Colorize;

use super::schema::{Field, FullType, Schema, TypeKind};

pub fn print_schema_overview(schema: &Schema, expand_types: bool) {
    let sections = schema.root_sections();
    if sections.is_empty() {
        println!("{}", "Schema has no root operation fields.".dimmed());
        return;
    }

    for section in sections {
        println!("{}", section.operation.title().bold());
        for field in section.fields {
            print_field(field, 2);
            if expand_types {
                if let Some(ty) = schema.field_type(field) {
                    print_type_detail(ty, 6);
                }
            }
        }
        println!();
    }
}

fn print_field(field: &Field, indent: usize) {
    let pad = " ".repeat(indent);
    let args = if field.args.is_empty() {
        String::new()
    } else {
        let rendered: Vec<String> = field
            .args
            .iter()
            .map(|arg| format!("{}: {}", arg.name.yellow(), arg.ty.to_string().magenta()))
            .collect();
        format!("({})", rendered.join(", "))
    };
    let mut line = format!(
        "{pad}{}{args}: {}",
        field.name.blue().bold(),
        field.ty.to_string().magenta()
    );
    if field.is_deprecated {
        line.push_str(&format!(" {}", "(deprecated)".red()));
    }
    println!("{line}");
    if let Some(description) = field.description.as_deref().filter(|d| !d.is_empty()) {
        println!("{pad}  {}", description.dimmed());
    }
}

fn print_type_detail(ty: &FullType, indent: usize) {
    let pad = " ".repeat(indent);
    if let Some(description) = ty.description.as_deref().filter(|d| !d.is_empty()) {
        println!("{pad}{}", description.dimmed());
    }
    match ty.kind {
        TypeKind::Enum => {
            for value in ty.enum_values.iter().flatten() {
                println!("{pad}{}", value.name.bold());
            }
        }
        TypeKind::InputObject => {
            for field in ty.input_fields.iter().flatten() {
                println!("{pad}{}: {}", field.name.blue(), field.ty.to_string().magenta());
            }
        }
        _ => {
            for field in ty.fields.iter().flatten() {
                println!("{pad}{}: {}", field.name.blue(), field.ty.to_string().magenta());
            }
        }
    }
}
