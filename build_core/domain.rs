use serde::Deserialize;

//==================================================================================SCHEMA_DOC
// Structures used to deserialize `pgn_schema.json` (canboat naming).
#[derive(Debug, Deserialize)]
/// Root of the schema document.
pub(crate) struct SchemaDocument {
    #[serde(rename = "PGNs")]
    pub(crate) pgns: Vec<PgnInstructions>,
}

//==========================================PGN
#[derive(Debug, Deserialize)]
/// PGN layout as written in the schema.
pub(crate) struct PgnInstructions {
    /// 1. Numeric PGN identifier.
    #[serde(rename = "PGN")]
    pub pgn_id: u32,
    /// 2. PGN name (debugging purposes).
    #[serde(rename = "Id")]
    pub pgn_name: String,
    /// 3. Human-friendly description.
    #[serde(rename = "Description")]
    pub pgn_description: String,
    /// 4. Message priority.
    #[serde(rename = "Priority")]
    pub priority: Option<u8>,
    /// 5. Transport type ("Fast" / "Single").
    #[serde(rename = "Type")]
    pub fastpacket: String,
    /// 6. Payload length in bytes.
    #[serde(rename = "Length")]
    pub length: Option<u16>,
    /// 7. Discriminator when several layouts share the PGN.
    #[serde(rename = "Match")]
    pub match_value: Option<u64>,
    /// 8. Repeating Field Set 1 size.
    #[serde(rename = "RepeatingFieldSet1Size")]
    pub repeating_field_set_1_size: Option<u16>,
    /// 9. Repeating Field Set 1 start field order.
    #[serde(rename = "RepeatingFieldSet1StartField")]
    pub repeating_field_set_1_start_field: Option<u16>,
    /// 10. Repeating Field Set 1 counter field order.
    #[serde(rename = "RepeatingFieldSet1CountField")]
    pub repeating_field_set_1_count_field: Option<u16>,
    /// 11. Field descriptors.
    #[serde(rename = "Fields")]
    pub fields: Vec<Fields>,
}

#[derive(Debug, Deserialize)]
/// Field descriptor as written in the schema.
pub(crate) struct Fields {
    /// 0. Field order inside the table (1-based).
    #[serde(rename = "Order")]
    pub order: u16,
    /// 1. Identifier.
    #[serde(rename = "Id")]
    pub id: String,
    /// 2. Display name.
    #[serde(rename = "Name")]
    pub name: String,
    /// 3. Semantic field type.
    #[serde(rename = "FieldType")]
    pub kind: String,
    /// 4. Field length in bits.
    #[serde(rename = "BitLength")]
    pub bits_length: Option<u32>,
    /// 5. Whether the field length is variable.
    #[serde(rename = "BitLengthVariable")]
    pub bits_length_var: Option<bool>,
    /// 6. Absolute bit offset from the start of the payload.
    #[serde(rename = "BitOffset")]
    pub bits_offset: Option<u32>,
    /// 7. Whether numeric fields are signed.
    #[serde(rename = "Signed")]
    pub signed: Option<bool>,
    /// 8. Optional resolution factor.
    #[serde(rename = "Resolution")]
    pub resolution: Option<f32>,
    /// 9. Physical unit (e.g. "m/s", "rad").
    #[serde(rename = "Unit")]
    pub physical_unit: Option<String>,
    /// 10. Constant value carried by the field.
    #[serde(rename = "Match")]
    pub match_value: Option<u64>,
}

//==================================================================================REPEATING
#[derive(Debug, PartialEq, Eq)]
/// Repeating field set converted to 0-based indices.
pub(crate) struct RepeatingFieldSetInfo {
    pub count_field_index: usize,
    pub start_field_index: usize,
    pub size: usize,
    pub max_repetitions: usize,
}
