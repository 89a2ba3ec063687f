//! Grounding: expanding lifted declarations into scalar instances.
//!
//! Every variable gets a contiguous block of [`GroundId`]s, blocks laid
//! out in declaration order. Within a block, instances follow the cross
//! product of the parameters' object enumerations with the last parameter
//! varying fastest. The position of an instance is therefore a mixed-radix
//! number whose digits are the arguments' positions within their types,
//! which lets [`Grounding::ground_id`] map arguments to an id in O(arity).

use std::ops::Range;

use rddl_core::{Args, GroundId, ModelError, ObjectId, TypeId, VarId};
use smallvec::SmallVec;

use crate::registry::TypeRegistry;
use crate::symbols::SymbolTable;

/// One grounded variable instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroundVar {
    /// Lifted declaration.
    pub var: VarId,
    /// Concrete arguments.
    pub args: Args,
}

#[derive(Clone, Debug)]
struct Block {
    base: u32,
    len: u32,
    params: SmallVec<[TypeId; 4]>,
    radices: SmallVec<[u32; 4]>,
}

/// The grounded variable arena of a model.
#[derive(Clone, Debug, Default)]
pub struct Grounding {
    instances: Vec<GroundVar>,
    blocks: Vec<Block>,
}

impl Grounding {
    /// Ground every declaration of `symbols` over the objects of `registry`.
    ///
    /// Block sizes are checked before any instance is materialized; a
    /// layout whose ids would not fit in a [`GroundId`] is rejected.
    pub fn build(symbols: &SymbolTable, registry: &TypeRegistry) -> Result<Self, ModelError> {
        let mut blocks = Vec::with_capacity(symbols.len());
        let mut next = 0u32;
        for (_, decl) in symbols.iter() {
            let overflow = || ModelError::GroundingOverflow {
                name: decl.name.clone(),
            };
            let params: SmallVec<[TypeId; 4]> = decl.params.iter().copied().collect();
            let radices = params
                .iter()
                .map(|&t| u32::try_from(registry.objects_of(t).len()).map_err(|_| overflow()))
                .collect::<Result<SmallVec<[u32; 4]>, _>>()?;
            let len = radices
                .iter()
                .try_fold(1u32, |acc, &r| acc.checked_mul(r))
                .ok_or_else(overflow)?;
            let base = next;
            next = base.checked_add(len).ok_or_else(overflow)?;
            blocks.push(Block {
                base,
                len,
                params,
                radices,
            });
        }

        let mut instances = Vec::with_capacity(next as usize);
        for ((var, _), block) in symbols.iter().zip(&blocks) {
            for args in cross_product(registry, &block.params) {
                instances.push(GroundVar { var, args });
            }
        }
        Ok(Self { instances, blocks })
    }

    /// Number of grounded instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether there are no grounded instances.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// The instance behind an id.
    pub fn get(&self, id: GroundId) -> Option<&GroundVar> {
        self.instances.get(id.index())
    }

    /// All instances in id order.
    pub fn iter(&self) -> impl Iterator<Item = (GroundId, &GroundVar)> {
        self.instances
            .iter()
            .enumerate()
            .map(|(i, g)| (GroundId(i as u32), g))
    }

    /// The ids of every instance of `var`, in grounding order.
    pub fn ids_of(&self, var: VarId) -> impl Iterator<Item = GroundId> {
        let range = self
            .blocks
            .get(var.0 as usize)
            .map_or(0..0, |b| b.base..b.base + b.len);
        range.map(GroundId)
    }

    /// Raw id range of `var`'s block.
    pub fn range_of(&self, var: VarId) -> Range<usize> {
        self.blocks
            .get(var.0 as usize)
            .map_or(0..0, |b| b.base as usize..(b.base + b.len) as usize)
    }

    /// The id of `var(args)`, or `None` if the arity is wrong or an
    /// argument is not an object of the corresponding parameter type.
    pub fn ground_id(
        &self,
        var: VarId,
        args: &[ObjectId],
        registry: &TypeRegistry,
    ) -> Option<GroundId> {
        let block = self.blocks.get(var.0 as usize)?;
        if args.len() != block.params.len() {
            return None;
        }
        let mut offset = 0u32;
        for ((&arg, &ty), &radix) in args.iter().zip(&block.params).zip(&block.radices) {
            let info = registry.object(arg)?;
            if info.ty != ty {
                return None;
            }
            offset = offset.checked_mul(radix)?.checked_add(info.position)?;
        }
        block.base.checked_add(offset).map(GroundId)
    }

    /// Display name of an instance, e.g. `PICT_XPOS(p1)`.
    pub fn name(&self, id: GroundId, symbols: &SymbolTable, registry: &TypeRegistry) -> String {
        let Some(g) = self.get(id) else {
            return format!("<ground {id}>");
        };
        let mut name = symbols.name(g.var).to_string();
        if !g.args.is_empty() {
            name.push('(');
            for (i, &arg) in g.args.iter().enumerate() {
                if i > 0 {
                    name.push_str(", ");
                }
                name.push_str(registry.object_name(arg));
            }
            name.push(')');
        }
        name
    }
}

/// Every argument tuple over `params`, last parameter fastest. A single
/// empty tuple for zero parameters; nothing if any type is empty.
pub fn cross_product(registry: &TypeRegistry, params: &[TypeId]) -> Vec<Args> {
    let ranges: SmallVec<[&[ObjectId]; 4]> =
        params.iter().map(|&t| registry.objects_of(t)).collect();
    if ranges.iter().any(|r| r.is_empty()) {
        return Vec::new();
    }
    let total: usize = ranges.iter().map(|r| r.len()).product();
    let mut out = Vec::with_capacity(total);
    let mut digits: SmallVec<[usize; 4]> = SmallVec::from_elem(0, ranges.len());
    loop {
        out.push(
            digits
                .iter()
                .zip(&ranges)
                .map(|(&d, r)| r[d])
                .collect::<Args>(),
        );
        // Increment the mixed-radix counter from the last digit.
        let mut i = digits.len();
        loop {
            if i == 0 {
                return out;
            }
            i -= 1;
            digits[i] += 1;
            if digits[i] < ranges[i].len() {
                break;
            }
            digits[i] = 0;
        }
    }
}
