pub mod layout;
pub mod metadata;

pub use layout::{decode_layout, decode_position, DecodeError, DecodedPosition, PositionLayout};
pub use metadata::{
    align_tick, extract_fields, price_to_tick, MetadataFields, MetadataResolver, NftMetadata,
};
