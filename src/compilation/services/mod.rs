mod declaration_resolver;
mod similarity_clustering;

pub use declaration_resolver::{DeclarationResolver, ResolvedDeclarations};
pub use similarity_clustering::SimilarityClustering;
