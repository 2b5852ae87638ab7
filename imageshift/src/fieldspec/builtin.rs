use std::sync::OnceLock;

use super::FieldSpecs;

const IMAGES: &[u8] = include_bytes!("images.yaml");

/// Field specs addressing every container image inside the pod templates of
/// the supported workload kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Builtin {
    pub images: FieldSpecs,
}

impl Builtin {
    pub fn get() -> &'static Self {
        static INSTANCE: OnceLock<Builtin> = OnceLock::new();
        INSTANCE.get_or_init(|| Builtin {
            images: serde_yaml::from_slice::<FieldSpecs>(IMAGES).expect("image field specs"),
        })
    }
}

#[cfg(test)]
#[test]
fn ensure_builtin_fieldspecs_valid() {
    let builtin = Builtin::get();

    let mut merged = FieldSpecs::default();
    merged
        .merge(builtin.images.clone())
        .expect("builtin specs must not overlap");
}
