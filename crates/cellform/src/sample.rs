//! A ready-made four-box layout for demos and tests.

use crate::error::Result;
use crate::field::TextBoxSpec;
use crate::form::Form;
use crate::style::{style_cursor, style_fill, style_helper};

/// The sample boxes, in registration order.
///
/// Tab-order keys are 0, 2, 4 and 7; all boxes sit at column 80 with their
/// descriptions to the left.
pub fn sample_text_boxes() -> Vec<TextBoxSpec> {
    let base = |name: &str| {
        TextBoxSpec::new(name)
            .style_cursor(style_cursor("white").blink(true))
            .style_fill(style_fill("grey"))
            .style_text(style_helper("black", "grey"))
            .style_description(style_helper("white", "black"))
            .show_description(true)
    };

    vec![
        base("test1")
            .tab_order(0)
            .default_value("Joe")
            .description("What is the name of your favorite childhood friend?")
            .position(80, 5)
            .size(10, 1),
        base("test2")
            .tab_order(2)
            .description("Where did you grow up?")
            .position(80, 7)
            .size(20, 1),
        base("test3")
            .tab_order(4)
            .default_value("super long value")
            .description("Age")
            .position(80, 9)
            .size(5, 1),
        base("test4")
            .tab_order(7)
            .description("Weight")
            .position(80, 11)
            .size(5, 1),
    ]
}

/// Register the sample boxes on `form`.
pub fn add_sample_text_boxes(form: &mut Form) -> Result<()> {
    for spec in sample_text_boxes() {
        form.add_text_box(spec)?;
    }
    Ok(())
}
