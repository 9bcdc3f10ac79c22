//! Validate query params with type checking
use serde::Deserialize;
use warp::filters::BoxedFilter;
use warp::Filter as WarpFilter;

macro_rules! make_query_type {
    ($name:tt => $parameter:tt:$type:ty) => {
        #[derive(Deserialize, Debug, Default)]
        pub(crate) struct $name {
            pub(crate) $parameter: $type,
        }
        impl $name {
            pub(crate) fn to_filter() -> BoxedFilter<(Self,)> {
                warp::query()
                    .or(warp::any().map(Self::default))
                    .unify()
                    .boxed()
            }
        }
    };
}
make_query_type!(Remove => remove: String);
impl Remove {
    pub(crate) fn is_truthy(&self) -> bool {
        self.remove == "true" || self.remove == "1"
    }
}
