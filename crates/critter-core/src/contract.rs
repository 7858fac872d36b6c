//! Names and descriptors shared by the generators that emit classes and the
//! handles that call into them.

///
/// Member
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Member {
    pub name: &'static str,
    pub descriptor: &'static str,
}

impl Member {
    const fn new(name: &'static str, descriptor: &'static str) -> Self {
        Self { name, descriptor }
    }
}

pub const OBJECT: &str = "java.lang.Object";
pub const STRING: &str = "java.lang.String";
pub const ENUM: &str = "java.lang.Enum";
pub const ANNOTATION: &str = "java.lang.annotation.Annotation";

pub const CONFIG: &str = "critter.mapping.MappingConfig";
pub const TYPE_DATA: &str = "critter.mapping.TypeData";
pub const MEMBER_HANDLE: &str = "critter.mapping.MemberHandle";

pub const ACCESSOR: &str = "critter.mapping.PropertyAccessor";
pub const PROPERTY_MODEL: &str = "critter.mapping.PropertyModel";
pub const ENTITY_MODEL: &str = "critter.mapping.EntityModel";

pub const CONSTRUCTOR: &str = "<init>";
pub const NO_ARG_CONSTRUCTOR: &str = "()V";

pub const LIST_DESCRIPTOR: &str = "Ljava/util/List;";
pub const OBJECT_DESCRIPTOR: &str = "Ljava/lang/Object;";
pub const CONFIG_DESCRIPTOR: &str = "Lcritter/mapping/MappingConfig;";
pub const HANDLE_DESCRIPTOR: &str = "Lcritter/mapping/MemberHandle;";
pub const ACCESSOR_DESCRIPTOR: &str = "Lcritter/mapping/PropertyAccessor;";

/// Field every model class keeps its replayed annotations in.
pub const ANNOTATIONS_FIELD: &str = "annotations";

pub mod accessor {
    use super::Member;

    pub const GET: Member = Member::new("get", "(Ljava/lang/Object;)Ljava/lang/Object;");
    pub const SET: Member = Member::new("set", "(Ljava/lang/Object;Ljava/lang/Object;)V");
}

pub mod property_model {
    use super::Member;

    pub const NAME: Member = Member::new("getName", "()Ljava/lang/String;");
    pub const FULL_NAME: Member = Member::new("getFullName", "()Ljava/lang/String;");
    pub const MAPPED_NAME: Member = Member::new("getMappedName", "()Ljava/lang/String;");
    pub const LOAD_NAMES: Member = Member::new("getLoadNames", "()Ljava/util/List;");
    pub const TYPE_DATA: Member = Member::new("getTypeData", "()Lcritter/mapping/TypeData;");
    pub const IS_ARRAY: Member = Member::new("isArray", "()Z");
    pub const IS_MAP: Member = Member::new("isMap", "()Z");
    pub const IS_SET: Member = Member::new("isSet", "()Z");
    pub const IS_COLLECTION: Member = Member::new("isCollection", "()Z");
    pub const IS_FINAL: Member = Member::new("isFinal", "()Z");
    pub const IS_TRANSIENT: Member = Member::new("isTransient", "()Z");
    pub const IS_REFERENCE: Member = Member::new("isReference", "()Z");
    pub const IS_ID: Member = Member::new("isId", "()Z");
    pub const IS_VERSION: Member = Member::new("isVersion", "()Z");
    pub const ACCESSOR: Member =
        Member::new("getAccessor", "()Lcritter/mapping/PropertyAccessor;");
    pub const ANNOTATIONS: Member = Member::new("getAnnotations", "()Ljava/util/List;");

    pub const ACCESSOR_FIELD: &str = "accessor";
}

pub mod entity_model {
    use super::Member;

    pub const CONSTRUCTOR_DESCRIPTOR: &str = "(Lcritter/mapping/MappingConfig;)V";

    pub const NAME: Member = Member::new("getName", "()Ljava/lang/String;");
    pub const SIMPLE_NAME: Member = Member::new("getSimpleName", "()Ljava/lang/String;");
    pub const COLLECTION_NAME: Member = Member::new("getCollectionName", "()Ljava/lang/String;");
    pub const DISCRIMINATOR: Member = Member::new("getDiscriminator", "()Ljava/lang/String;");
    pub const DISCRIMINATOR_KEY: Member =
        Member::new("getDiscriminatorKey", "()Ljava/lang/String;");
    pub const USE_DISCRIMINATOR: Member = Member::new("isUseDiscriminator", "()Z");
    pub const IS_ABSTRACT: Member = Member::new("isAbstract", "()Z");
    pub const IS_INTERFACE: Member = Member::new("isInterface", "()Z");
    pub const IS_EMBEDDED: Member = Member::new("isEmbedded", "()Z");
    pub const TYPE: Member = Member::new("getType", "()Lcritter/mapping/TypeData;");
    pub const PROPERTIES: Member = Member::new("getProperties", "()Ljava/util/List;");
    pub const ANNOTATIONS: Member = Member::new("getAnnotations", "()Ljava/util/List;");
    pub const CONFIG: Member = Member::new("getConfig", "()Lcritter/mapping/MappingConfig;");

    pub const CONFIG_FIELD: &str = "config";
    pub const COLLECTION_NAME_FIELD: &str = "collectionName";
    pub const DISCRIMINATOR_FIELD: &str = "discriminator";
    pub const DISCRIMINATOR_KEY_FIELD: &str = "discriminatorKey";
    pub const PROPERTIES_FIELD: &str = "properties";
}

const MAP_TYPES: &[&str] = &[
    "java.util.Map",
    "java.util.HashMap",
    "java.util.LinkedHashMap",
    "java.util.SortedMap",
    "java.util.TreeMap",
    "java.util.concurrent.ConcurrentHashMap",
];

const SET_TYPES: &[&str] = &[
    "java.util.Set",
    "java.util.HashSet",
    "java.util.LinkedHashSet",
    "java.util.SortedSet",
    "java.util.TreeSet",
    "java.util.EnumSet",
];

const LIST_TYPES: &[&str] = &[
    "java.lang.Iterable",
    "java.util.Collection",
    "java.util.List",
    "java.util.ArrayList",
    "java.util.LinkedList",
    "java.util.Vector",
    "java.util.Queue",
    "java.util.Deque",
];

#[must_use]
pub fn is_map_type(raw: &str) -> bool {
    MAP_TYPES.contains(&raw)
}

#[must_use]
pub fn is_set_type(raw: &str) -> bool {
    SET_TYPES.contains(&raw)
}

/// Any collection type, sets included.
#[must_use]
pub fn is_collection_type(raw: &str) -> bool {
    LIST_TYPES.contains(&raw) || is_set_type(raw)
}
