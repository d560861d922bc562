//! ABI descriptor over `alloy_json_abi::JsonAbi` plus call encoding.
//!
//! Reads compiled-contract artifacts (`{"abi": [...]}`) or bare ABI arrays.
//! [`CallCodec`] adds selector-checked encode/decode on top of
//! `alloy_dyn_abi`, coercing integer arguments to the declared bit width.

use alloy_dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt, Specifier};
use alloy_json_abi::{Function, JsonAbi, Param, StateMutability};
use serde_json::Value;

use crate::core::messages::contract as names;
use crate::error::AbiError;

/// Selector-checked calldata and return-data codec for one function.
pub trait CallCodec {
    /// `selector ++ encoded args`, after arity and type checks.
    fn encode_call(&self, args: &[DynSolValue]) -> Result<Vec<u8>, AbiError>;
    fn decode_call(&self, data: &[u8]) -> Result<Vec<DynSolValue>, AbiError>;
    fn encode_output(&self, values: &[DynSolValue]) -> Result<Vec<u8>, AbiError>;
    fn decode_output(&self, data: &[u8]) -> Result<Vec<DynSolValue>, AbiError>;
    fn is_read_only(&self) -> bool;
}

fn coerce(param: &Param, value: &DynSolValue) -> Result<DynSolValue, AbiError> {
    let ty: DynSolType = param.resolve().map_err(|e| AbiError::UnsupportedType(format!("{}: {}", param.ty, e)))?;
    match (&ty, value) {
        (DynSolType::Uint(bits), DynSolValue::Uint(v, _)) => {
            if v.bit_len() > *bits {
                return Err(AbiError::Overflow(param.ty.clone()));
            }
            Ok(DynSolValue::Uint(*v, *bits))
        }
        _ if ty.matches(value) => Ok(value.clone()),
        _ => Err(AbiError::Mismatch(param.ty.clone())),
    }
}

fn coerce_all(function: &Function, params: &[Param], values: &[DynSolValue]) -> Result<Vec<DynSolValue>, AbiError> {
    if values.len() != params.len() {
        return Err(AbiError::Arity { function: function.name.clone(), expected: params.len(), got: values.len() });
    }
    params.iter().zip(values).map(|(param, value)| coerce(param, value)).collect()
}

impl CallCodec for Function {
    fn encode_call(&self, args: &[DynSolValue]) -> Result<Vec<u8>, AbiError> {
        let args = coerce_all(self, &self.inputs, args)?;
        self.abi_encode_input(&args).map_err(|e| AbiError::Mismatch(format!("{}: {}", self.signature(), e)))
    }

    fn decode_call(&self, data: &[u8]) -> Result<Vec<DynSolValue>, AbiError> {
        if data.len() < 4 || data[..4] != self.selector()[..] {
            return Err(AbiError::Selector(self.signature()));
        }
        self.abi_decode_input(&data[4..], true).map_err(|e| AbiError::Decode(e.to_string()))
    }

    fn encode_output(&self, values: &[DynSolValue]) -> Result<Vec<u8>, AbiError> {
        let values = coerce_all(self, &self.outputs, values)?;
        self.abi_encode_output(&values).map_err(|e| AbiError::Mismatch(format!("{}: {}", self.signature(), e)))
    }

    fn decode_output(&self, data: &[u8]) -> Result<Vec<DynSolValue>, AbiError> {
        self.abi_decode_output(data, true).map_err(|e| AbiError::Decode(e.to_string()))
    }

    fn is_read_only(&self) -> bool {
        matches!(self.state_mutability, StateMutability::Pure | StateMutability::View)
    }
}

fn param(name: &str, ty: &str) -> Param {
    Param { ty: ty.into(), name: name.into(), components: Vec::new(), internal_type: None }
}

fn function(name: &str, inputs: Vec<Param>, outputs: Vec<Param>, state_mutability: StateMutability) -> Function {
    Function { name: name.into(), inputs, outputs, state_mutability }
}

/// Interface description of a deployed contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiDescriptor {
    abi: JsonAbi,
}

impl AbiDescriptor {
    pub fn new(abi: JsonAbi) -> Self { Self { abi } }

    /// The ATM contract: `getBalance() view returns (uint256)`, `deposit(uint256) payable`,
    /// `withdraw(uint256)`.
    pub fn assessment() -> Self {
        let amount = |name: &str| vec![param(name, "uint256")];
        let mut abi = JsonAbi::default();
        for f in [
            function(names::GET_BALANCE, vec![], amount(""), StateMutability::View),
            function(names::DEPOSIT, amount("_amount"), vec![], StateMutability::Payable),
            function(names::WITHDRAW, amount("_withdrawAmount"), vec![], StateMutability::NonPayable),
        ] {
            abi.functions.entry(f.name.clone()).or_default().push(f);
        }
        Self { abi }
    }

    pub fn from_json(raw: &str) -> Result<Self, AbiError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| AbiError::Artifact(e.to_string()))?;
        Self::from_value(value)
    }

    /// Accepts a compiler artifact (`{"abi": [...]}`) or the bare ABI array.
    pub fn from_value(value: Value) -> Result<Self, AbiError> {
        let entries = match value {
            Value::Array(entries) => entries,
            Value::Object(mut map) => match map.remove("abi") {
                Some(Value::Array(entries)) => entries,
                _ => return Err(AbiError::Artifact("object without 'abi' array".into())),
            },
            _ => return Err(AbiError::Artifact("expected array or artifact object".into())),
        };
        let abi: JsonAbi = serde_json::from_value(Value::Array(entries)).map_err(|e| AbiError::Artifact(e.to_string()))?;
        Ok(Self { abi })
    }

    /// First overload named `name`.
    pub fn function(&self, name: &str) -> Result<&Function, AbiError> {
        self.abi.function(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| AbiError::UnknownFunction(name.into()))
    }

    pub fn by_selector(&self, data: &[u8]) -> Option<&Function> {
        if data.len() < 4 { return None; }
        self.abi.functions().find(|f| f.selector()[..] == data[..4])
    }

    pub fn require(&self, names: &[&str]) -> Result<(), AbiError> {
        names.iter().try_for_each(|name| self.function(name).map(|_| ()))
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> { self.abi.functions() }

    pub fn json_abi(&self) -> &JsonAbi { &self.abi }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{keccak256, U256};
    use serde_json::json;

    fn uint(n: u64) -> DynSolValue { DynSolValue::from(U256::from(n)) }

    #[test]
    fn known_selectors() {
        assert_eq!(&keccak256("transfer(address,uint256)")[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        let abi = AbiDescriptor::assessment();
        assert_eq!(abi.function("getBalance").unwrap().selector()[..], [0x12, 0x06, 0x5f, 0xe0]);
        assert_eq!(abi.function("deposit").unwrap().selector()[..], [0xb6, 0xb5, 0x5f, 0x25]);
        assert_eq!(abi.function("withdraw").unwrap().selector()[..], [0x2e, 0x1a, 0x7d, 0x4d]);
        let deposit = abi.function("deposit").unwrap();
        assert_eq!(abi.by_selector(&deposit.selector()[..]).map(|f| f.name.as_str()), Some("deposit"));
    }

    #[test]
    fn encodes_deposit_call() {
        let abi = AbiDescriptor::assessment();
        let deposit = abi.function("deposit").unwrap();
        let data = deposit.encode_call(&[uint(100)]).unwrap();
        assert_eq!(data.len(), 36);
        assert_eq!(&data[..4], &[0xb6, 0xb5, 0x5f, 0x25]);
        assert_eq!(data[35], 100);
        assert!(data[4..35].iter().all(|b| *b == 0));
        assert_eq!(deposit.decode_call(&data).unwrap(), vec![uint(100)]);
        assert!(matches!(deposit.decode_call(&data[1..]), Err(AbiError::Selector(_))));
    }

    #[test]
    fn arity_and_type_checks() {
        let abi = AbiDescriptor::assessment();
        let deposit = abi.function("deposit").unwrap();
        assert!(matches!(deposit.encode_call(&[]), Err(AbiError::Arity { .. })));
        assert!(matches!(deposit.encode_call(&[DynSolValue::Bool(true)]), Err(AbiError::Mismatch(_))));
        assert!(matches!(abi.function("transfer"), Err(AbiError::UnknownFunction(_))));
    }

    #[test]
    fn decodes_values_above_u128() {
        let get = AbiDescriptor::assessment().function("getBalance").unwrap().clone();
        let big: U256 = U256::from(1u8) << 200;
        let word = big.to_be_bytes::<32>();
        assert_eq!(get.decode_output(&word).unwrap(), vec![DynSolValue::Uint(big, 256)]);
        assert_eq!(get.encode_output(&[DynSolValue::from(big)]).unwrap(), word.to_vec());
        assert!(matches!(get.decode_output(&word[..31]), Err(AbiError::Decode(_))));
    }

    #[test]
    fn small_uint_bounds() {
        let f = function("f", vec![param("x", "uint8")], vec![], StateMutability::NonPayable);
        assert!(f.encode_call(&[uint(255)]).is_ok());
        assert!(matches!(f.encode_call(&[uint(256)]), Err(AbiError::Overflow(_))));
    }

    #[test]
    fn parses_hardhat_artifact() {
        let artifact = json!({
            "contractName": "Assessment",
            "abi": [
                {"type": "constructor", "inputs": [{"name": "initBalance", "type": "uint256"}], "stateMutability": "payable"},
                {"type": "event", "name": "Deposit", "inputs": [{"name": "amount", "type": "uint256", "indexed": false}], "anonymous": false},
                {"type": "function", "name": "getBalance", "inputs": [], "outputs": [{"name": "", "type": "uint256"}], "stateMutability": "view"},
                {"type": "function", "name": "deposit", "inputs": [{"name": "_amount", "type": "uint256"}], "outputs": [], "stateMutability": "payable"},
                {"type": "function", "name": "withdraw", "inputs": [{"name": "_withdrawAmount", "type": "uint256"}], "outputs": [], "stateMutability": "nonpayable"}
            ]
        });
        let abi = AbiDescriptor::from_value(artifact).unwrap();
        assert_eq!(abi.functions().count(), 3);
        abi.require(names::REQUIRED).unwrap();
        assert!(abi.function("getBalance").unwrap().is_read_only());
        assert!(!abi.function("withdraw").unwrap().is_read_only());
        assert_eq!(abi.function("deposit").unwrap().selector(), AbiDescriptor::assessment().function("deposit").unwrap().selector());
    }

    #[test]
    fn rejects_malformed_artifacts() {
        assert!(AbiDescriptor::from_json("not json").is_err());
        assert!(AbiDescriptor::from_value(json!({"bytecode": "0x"})).is_err());
        assert!(AbiDescriptor::from_value(json!("abi")).is_err());
        let partial = AbiDescriptor::from_value(json!([
            {"type": "function", "name": "getBalance", "inputs": [], "outputs": [{"name": "", "type": "uint256"}], "stateMutability": "view"}
        ])).unwrap();
        assert!(partial.require(names::REQUIRED).is_err());
    }
}
