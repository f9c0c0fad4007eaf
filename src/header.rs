//! Renders layout descriptors as C declarations.
//!
//! `c_src/struct_bridge_layout.h` is the checked-in output of
//! [`render_c_header`] for the two demo structs; C code includes it instead of
//! declaring the structs by hand.

use crate::layout::{LayoutDescriptor, Packing};

const GUARD: &str = "STRUCT_BRIDGE_LAYOUT_H";

pub fn render_c_declaration(layout: &LayoutDescriptor) -> String {
    let mut out = format!(
        "/* {} v{}: {} bytes, align {} */\n",
        layout.name,
        layout.version,
        layout.size(),
        layout.align()
    );
    if let Packing::Packed(n) = layout.packing {
        out.push_str(&format!("#pragma pack(push, {n})\n"));
    }
    out.push_str("typedef struct\n{\n");
    for field in layout.fields {
        let suffix = match field.count {
            1 => String::new(),
            n => format!("[{n}]"),
        };
        out.push_str(&format!("    {} {}{};\n", field.ty.c_name(), field.name, suffix));
    }
    out.push_str(&format!("}} {};\n", layout.name));
    if let Packing::Packed(_) = layout.packing {
        out.push_str("#pragma pack(pop)\n");
    }
    out
}

pub fn render_c_header(layouts: &[&LayoutDescriptor]) -> String {
    let mut out = String::new();
    out.push_str("/* Generated by `struct-bridge header`. Do not edit. */\n");
    out.push_str(&format!("#ifndef {GUARD}\n#define {GUARD}\n"));
    out.push_str("\n#include <stdint.h>\n");
    for layout in layouts {
        out.push('\n');
        out.push_str(&render_c_declaration(layout));
    }
    out.push_str(&format!("\n#endif /* {GUARD} */\n"));
    out
}
