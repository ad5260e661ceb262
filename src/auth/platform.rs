use oso::PolarClass;

/// Resource for actions that are not scoped to an existing trip or bid, such
/// as posting a trip or browsing the ride board.
#[derive(Clone, Copy, Debug, Default)]
pub struct Platform;

impl PolarClass for Platform {
    fn get_polar_class_builder() -> oso::ClassBuilder<Platform> {
        oso::Class::builder().name("Platform")
    }

    fn get_polar_class() -> oso::Class {
        let builder = Platform::get_polar_class_builder();
        builder.build()
    }
}
