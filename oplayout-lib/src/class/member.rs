use core::mem::size_of;

use crate::{
    error::{
        LayoutError, LayoutResult, RELATIVE_OFFSET_IN_MEMBER_ACCESS,
        RELATIVE_OFFSET_WITHOUT_RELATIVE_SIZE, RELATIVE_TAG_REQUIRED,
    },
    layout::size::DeclaredSize,
    mem::instance::Instance,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberType {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    ISize,
    USize,
    F32,
    F64,
}

impl MemberType {
    pub const fn size(self) -> usize {
        match self {
            MemberType::Bool | MemberType::I8 | MemberType::U8 => 1,
            MemberType::I16 | MemberType::U16 => 2,
            MemberType::I32 | MemberType::U32 | MemberType::F32 => 4,
            MemberType::I64 | MemberType::U64 | MemberType::F64 => 8,
            MemberType::ISize | MemberType::USize => size_of::<usize>(),
        }
    }
    pub const fn name(self) -> &'static str {
        match self {
            MemberType::Bool => "bool",
            MemberType::I8 => "i8",
            MemberType::U8 => "u8",
            MemberType::I16 => "i16",
            MemberType::U16 => "u16",
            MemberType::I32 => "i32",
            MemberType::U32 => "u32",
            MemberType::I64 => "i64",
            MemberType::U64 => "u64",
            MemberType::ISize => "isize",
            MemberType::USize => "usize",
            MemberType::F32 => "f32",
            MemberType::F64 => "f64",
        }
    }
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => MemberType::Bool,
            "i8" => MemberType::I8,
            "u8" => MemberType::U8,
            "i16" => MemberType::I16,
            "u16" => MemberType::U16,
            "i32" => MemberType::I32,
            "u32" => MemberType::U32,
            "i64" => MemberType::I64,
            "u64" => MemberType::U64,
            "isize" => MemberType::ISize,
            "usize" => MemberType::USize,
            "f32" => MemberType::F32,
            "f64" => MemberType::F64,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MemberValue {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    ISize(isize),
    USize(usize),
    F32(f32),
    F64(f64),
}

impl MemberValue {
    pub const fn type_(&self) -> MemberType {
        match self {
            MemberValue::Bool(_) => MemberType::Bool,
            MemberValue::I8(_) => MemberType::I8,
            MemberValue::U8(_) => MemberType::U8,
            MemberValue::I16(_) => MemberType::I16,
            MemberValue::U16(_) => MemberType::U16,
            MemberValue::I32(_) => MemberType::I32,
            MemberValue::U32(_) => MemberType::U32,
            MemberValue::I64(_) => MemberType::I64,
            MemberValue::U64(_) => MemberType::U64,
            MemberValue::ISize(_) => MemberType::ISize,
            MemberValue::USize(_) => MemberType::USize,
            MemberValue::F32(_) => MemberType::F32,
            MemberValue::F64(_) => MemberType::F64,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemberFlags(u8);

impl MemberFlags {
    pub const NONE: Self = Self(0);
    pub const READONLY: Self = Self(1);
    /// The offset is relative to the class's private region.
    pub const RELATIVE_OFFSET: Self = Self(2);
    #[inline(always)]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
    #[inline(always)]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
    #[inline(always)]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberDef {
    pub name: String,
    pub type_: MemberType,
    pub offset: usize,
    pub flags: MemberFlags,
}

impl MemberDef {
    pub fn new(name: impl Into<String>, type_: MemberType, offset: usize) -> Self {
        Self {
            name: name.into(),
            type_,
            offset,
            flags: MemberFlags::NONE,
        }
    }
    pub fn relative(name: impl Into<String>, type_: MemberType, offset: usize) -> Self {
        Self::new(name, type_, offset).with_flags(MemberFlags::RELATIVE_OFFSET)
    }
    pub fn with_flags(mut self, flags: MemberFlags) -> Self {
        self.flags = self.flags.union(flags);
        self
    }
    pub fn readonly(self) -> Self {
        self.with_flags(MemberFlags::READONLY)
    }
    #[inline(always)]
    pub const fn is_relative(&self) -> bool {
        self.flags.contains(MemberFlags::RELATIVE_OFFSET)
    }
    #[inline(always)]
    pub const fn is_readonly(&self) -> bool {
        self.flags.contains(MemberFlags::READONLY)
    }
    fn access_ptr(&self, instance: Instance) -> LayoutResult<*mut u8> {
        if self.is_relative() {
            return Err(LayoutError::RelativeOffsetMisuse(
                RELATIVE_OFFSET_IN_MEMBER_ACCESS,
            ));
        }
        Ok(instance.as_ptr().wrapping_add(self.offset))
    }
    /// Reads the member from `instance`.
    ///
    /// # Safety
    ///
    /// `instance` must be a live instance of a class whose member table holds `self`.
    pub unsafe fn get(&self, instance: Instance) -> LayoutResult<MemberValue> {
        let p = self.access_ptr(instance)?;
        Ok(match self.type_ {
            MemberType::Bool => MemberValue::Bool(p.read() != 0),
            MemberType::I8 => MemberValue::I8(p.cast::<i8>().read()),
            MemberType::U8 => MemberValue::U8(p.read()),
            MemberType::I16 => MemberValue::I16(p.cast::<i16>().read_unaligned()),
            MemberType::U16 => MemberValue::U16(p.cast::<u16>().read_unaligned()),
            MemberType::I32 => MemberValue::I32(p.cast::<i32>().read_unaligned()),
            MemberType::U32 => MemberValue::U32(p.cast::<u32>().read_unaligned()),
            MemberType::I64 => MemberValue::I64(p.cast::<i64>().read_unaligned()),
            MemberType::U64 => MemberValue::U64(p.cast::<u64>().read_unaligned()),
            MemberType::ISize => MemberValue::ISize(p.cast::<isize>().read_unaligned()),
            MemberType::USize => MemberValue::USize(p.cast::<usize>().read_unaligned()),
            MemberType::F32 => MemberValue::F32(p.cast::<f32>().read_unaligned()),
            MemberType::F64 => MemberValue::F64(p.cast::<f64>().read_unaligned()),
        })
    }
    /// Writes the member of `instance`.
    ///
    /// # Safety
    ///
    /// Same as [`MemberDef::get`], and nothing else may access the member concurrently.
    pub unsafe fn set(&self, instance: Instance, value: MemberValue) -> LayoutResult<()> {
        let p = self.access_ptr(instance)?;
        if self.is_readonly() {
            return Err(LayoutError::ReadOnlyMember {
                name: self.name.clone(),
            });
        }
        if value.type_() != self.type_ {
            return Err(LayoutError::MemberTypeMismatch {
                name: self.name.clone(),
            });
        }
        match value {
            MemberValue::Bool(v) => p.write(v as u8),
            MemberValue::I8(v) => p.cast::<i8>().write(v),
            MemberValue::U8(v) => p.write(v),
            MemberValue::I16(v) => p.cast::<i16>().write_unaligned(v),
            MemberValue::U16(v) => p.cast::<u16>().write_unaligned(v),
            MemberValue::I32(v) => p.cast::<i32>().write_unaligned(v),
            MemberValue::U32(v) => p.cast::<u32>().write_unaligned(v),
            MemberValue::I64(v) => p.cast::<i64>().write_unaligned(v),
            MemberValue::U64(v) => p.cast::<u64>().write_unaligned(v),
            MemberValue::ISize(v) => p.cast::<isize>().write_unaligned(v),
            MemberValue::USize(v) => p.cast::<usize>().write_unaligned(v),
            MemberValue::F32(v) => p.cast::<f32>().write_unaligned(v),
            MemberValue::F64(v) => p.cast::<f64>().write_unaligned(v),
        }
        Ok(())
    }
}

pub const DICT_OFFSET: &str = "__dictoffset__";
pub const WEAKLIST_OFFSET: &str = "__weaklistoffset__";
pub const VECTORCALL_OFFSET: &str = "__vectorcalloffset__";

/// Absolute offsets of the special members a class may declare.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpecialOffsets {
    pub dict: Option<usize>,
    pub weaklist: Option<usize>,
    pub vectorcall: Option<usize>,
}

impl SpecialOffsets {
    fn slot(&mut self, name: &str) -> Option<&mut Option<usize>> {
        match name {
            DICT_OFFSET => Some(&mut self.dict),
            WEAKLIST_OFFSET => Some(&mut self.weaklist),
            VECTORCALL_OFFSET => Some(&mut self.vectorcall),
            _ => None,
        }
    }
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> {
        [
            (DICT_OFFSET, self.dict),
            (WEAKLIST_OFFSET, self.weaklist),
            (VECTORCALL_OFFSET, self.vectorcall),
        ]
        .into_iter()
        .filter_map(|(name, offset)| offset.map(|o| (name, o)))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedMembers {
    pub members: Vec<MemberDef>,
    pub special: SpecialOffsets,
}

fn rewrite_offset(member: &MemberDef, declared: DeclaredSize, base_offset: usize) -> LayoutResult<MemberDef> {
    let Some(extra) = declared.extra() else {
        if member.is_relative() {
            return Err(LayoutError::RelativeOffsetMisuse(
                RELATIVE_OFFSET_WITHOUT_RELATIVE_SIZE,
            ));
        }
        return Ok(member.clone());
    };
    if !member.is_relative() {
        return Err(LayoutError::RelativeOffsetMisuse(RELATIVE_TAG_REQUIRED));
    }
    let out_of_range = || LayoutError::MemberOutOfRange {
        name: member.name.clone(),
    };
    let end = member
        .offset
        .checked_add(member.type_.size())
        .ok_or_else(out_of_range)?;
    if end > extra {
        return Err(out_of_range());
    }
    Ok(MemberDef {
        name: member.name.clone(),
        type_: member.type_,
        offset: member.offset + base_offset,
        flags: member.flags.difference(MemberFlags::RELATIVE_OFFSET),
    })
}

/// Turns author-time member offsets into offsets from the instance address.
pub fn rewrite_offsets(
    members: &[MemberDef],
    declared: DeclaredSize,
    base_offset: usize,
) -> LayoutResult<ResolvedMembers> {
    let mut result = ResolvedMembers::default();
    for member in members {
        let resolved = rewrite_offset(member, declared, base_offset)?;
        match result.special.slot(&resolved.name) {
            Some(slot) => {
                if resolved.type_ != MemberType::ISize || !resolved.is_readonly() {
                    return Err(LayoutError::InvalidSpecialMember {
                        name: resolved.name,
                    });
                }
                *slot = Some(resolved.offset);
            }
            None => result.members.push(resolved),
        }
    }
    Ok(result)
}

#[cfg(test)]
mod test {
    use wasm_bindgen_test::wasm_bindgen_test;

    use crate::{
        error::{
            LayoutError, RELATIVE_OFFSET_IN_MEMBER_ACCESS, RELATIVE_OFFSET_WITHOUT_RELATIVE_SIZE,
            RELATIVE_TAG_REQUIRED,
        },
        layout::size::DeclaredSize,
        mem::instance::Instance,
    };

    use super::{
        rewrite_offsets, MemberDef, MemberFlags, MemberType, MemberValue, DICT_OFFSET,
        VECTORCALL_OFFSET,
    };

    #[test]
    #[wasm_bindgen_test]
    fn test_flags() {
        let f = MemberFlags::READONLY.union(MemberFlags::RELATIVE_OFFSET);
        assert!(f.contains(MemberFlags::READONLY));
        assert!(f.contains(MemberFlags::RELATIVE_OFFSET));
        let g = f.difference(MemberFlags::RELATIVE_OFFSET);
        assert!(g.contains(MemberFlags::READONLY));
        assert!(!g.contains(MemberFlags::RELATIVE_OFFSET));
        assert!(MemberFlags::NONE.contains(MemberFlags::NONE));
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_type_names() {
        for t in [MemberType::Bool, MemberType::U16, MemberType::ISize, MemberType::F64] {
            assert_eq!(MemberType::from_name(t.name()), Some(t));
        }
        assert_eq!(MemberType::from_name("object"), None);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_rewrite() {
        let members = [
            MemberDef::relative("a", MemberType::I64, 0),
            MemberDef::relative("b", MemberType::U32, 8).readonly(),
        ];
        let r = rewrite_offsets(&members, DeclaredSize::Relative(16), 32).unwrap();
        assert_eq!(r.members.len(), 2);
        assert_eq!(r.members[0].offset, 32);
        assert_eq!(r.members[1].offset, 40);
        assert!(r.members.iter().all(|m| !m.is_relative()));
        assert!(r.members[1].is_readonly());
        assert_eq!(r.special.iter().count(), 0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_absolute_members_untouched() {
        let members = [MemberDef::new("a", MemberType::I32, 20)];
        let r = rewrite_offsets(&members, DeclaredSize::Absolute(40), 32).unwrap();
        assert_eq!(r.members, members);
        let r = rewrite_offsets(&members, DeclaredSize::Inherit, 32).unwrap();
        assert_eq!(r.members, members);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_relative_without_relative_size() {
        let members = [MemberDef::relative("a", MemberType::I32, 0)];
        assert_eq!(
            rewrite_offsets(&members, DeclaredSize::Absolute(40), 0),
            Err(LayoutError::RelativeOffsetMisuse(
                RELATIVE_OFFSET_WITHOUT_RELATIVE_SIZE
            ))
        );
        assert_eq!(
            rewrite_offsets(&members, DeclaredSize::Inherit, 0),
            Err(LayoutError::RelativeOffsetMisuse(
                RELATIVE_OFFSET_WITHOUT_RELATIVE_SIZE
            ))
        );
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_tag_required() {
        let members = [MemberDef::new("a", MemberType::I32, 0)];
        assert_eq!(
            rewrite_offsets(&members, DeclaredSize::Relative(8), 16),
            Err(LayoutError::RelativeOffsetMisuse(RELATIVE_TAG_REQUIRED))
        );
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_out_of_range() {
        let members = [MemberDef::relative("a", MemberType::I64, 4)];
        assert_eq!(
            rewrite_offsets(&members, DeclaredSize::Relative(8), 16),
            Err(LayoutError::MemberOutOfRange { name: "a".into() })
        );
        let members = [MemberDef::relative("a", MemberType::U8, usize::MAX)];
        assert_eq!(
            rewrite_offsets(&members, DeclaredSize::Relative(8), 16),
            Err(LayoutError::MemberOutOfRange { name: "a".into() })
        );
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_special() {
        let members = [
            MemberDef::relative(VECTORCALL_OFFSET, MemberType::ISize, 8).readonly(),
            MemberDef::relative("x", MemberType::ISize, 0),
        ];
        let r = rewrite_offsets(&members, DeclaredSize::Relative(16), 48).unwrap();
        assert_eq!(r.special.vectorcall, Some(56));
        assert_eq!(r.special.dict, None);
        assert_eq!(r.members.len(), 1);
        assert_eq!(r.special.iter().collect::<Vec<_>>(), [(VECTORCALL_OFFSET, 56)]);

        let members = [MemberDef::relative(DICT_OFFSET, MemberType::ISize, 0)];
        assert_eq!(
            rewrite_offsets(&members, DeclaredSize::Relative(16), 48),
            Err(LayoutError::InvalidSpecialMember {
                name: DICT_OFFSET.into()
            })
        );
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_get_set() {
        let mut buffer = [0u64; 4];
        let instance = unsafe { Instance::from_ptr(buffer.as_mut_ptr() as *mut u8) };
        let a = MemberDef::new("a", MemberType::I32, 4);
        let b = MemberDef::new("b", MemberType::F64, 8);
        let c = MemberDef::new("c", MemberType::Bool, 16).readonly();
        unsafe {
            assert_eq!(a.get(instance), Ok(MemberValue::I32(0)));
            a.set(instance, MemberValue::I32(-7)).unwrap();
            assert_eq!(a.get(instance), Ok(MemberValue::I32(-7)));
            b.set(instance, MemberValue::F64(1.5)).unwrap();
            assert_eq!(b.get(instance), Ok(MemberValue::F64(1.5)));
            assert_eq!(
                b.set(instance, MemberValue::I64(1)),
                Err(LayoutError::MemberTypeMismatch { name: "b".into() })
            );
            assert_eq!(
                c.set(instance, MemberValue::Bool(true)),
                Err(LayoutError::ReadOnlyMember { name: "c".into() })
            );
            assert_eq!(c.get(instance), Ok(MemberValue::Bool(false)));
        }
        assert_eq!(buffer[1].to_ne_bytes(), 1.5f64.to_ne_bytes());
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_unresolved_access() {
        let mut buffer = [0u64; 2];
        let instance = unsafe { Instance::from_ptr(buffer.as_mut_ptr() as *mut u8) };
        let a = MemberDef::relative("a", MemberType::I32, 0);
        let err = Err(LayoutError::RelativeOffsetMisuse(
            RELATIVE_OFFSET_IN_MEMBER_ACCESS,
        ));
        unsafe {
            assert_eq!(a.get(instance), err);
            assert_eq!(a.set(instance, MemberValue::I32(1)), err.map(|_| ()));
        }
    }
}
