//! Only plain identifiers reach SQL text.

use proptest::prelude::*;

use rewind_core::errors::{RewindError, SchemaError};
use rewind_core::schema::{EntityDefinition, FieldDefinition, SchemaCatalog};

fn with_column(column: &str) -> Result<SchemaCatalog, RewindError> {
    let mut def = EntityDefinition::new("Item");
    def.identifier = vec!["id".to_string()];
    def.fields = vec![
        FieldDefinition {
            name: "id".to_string(),
            column: None,
            codec: "integer".to_string(),
        },
        FieldDefinition {
            name: "value".to_string(),
            column: Some(column.to_string()),
            codec: "text".to_string(),
        },
    ];
    SchemaCatalog::builder().entity(def).build()
}

proptest! {
    #[test]
    fn plain_identifiers_are_accepted(column in "[A-Za-z_][A-Za-z0-9_]{0,15}") {
        let catalog = with_column(&column).unwrap();
        let item = catalog.descriptor_for("Item").unwrap();
        prop_assert_eq!(&item.field("value").unwrap().column, &column);
    }

    #[test]
    fn names_with_sql_punctuation_are_rejected(
        head in "[a-z]{1,6}",
        sep in prop::sample::select(vec![" ", ";", "'", "-", "(", "."]),
        tail in "[a-z]{0,6}"
    ) {
        let column = format!("{head}{sep}{tail}");
        let is_invalid = matches!(
            with_column(&column),
            Err(RewindError::Schema(SchemaError::InvalidIdentifier { .. }))
        );
        prop_assert!(is_invalid);
    }
}
