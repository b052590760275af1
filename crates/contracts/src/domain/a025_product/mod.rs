pub mod aggregate;

pub use aggregate::{
    BulkImportRequest, BulkImportResponse, CreatedProduct, NormalizedProduct, ProductLookup,
    ProductRecord, ProductUpdate,
};
