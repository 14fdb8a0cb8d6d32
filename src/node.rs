use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

const LEAF: u16 = 0;
const CHILDREN: u16 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Split {
	pub value: f64,
	pub column: usize,
}

impl Split {
	pub fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
		writer.write_f64::<BigEndian>(self.value)?;
		writer.write_u16::<BigEndian>(self.column as u16)?;

		Ok(())
	}

	pub fn deserialize<R: Read>(reader: &mut R) -> std::io::Result<Self> {
		let value = reader.read_f64::<BigEndian>()?;
		let column = reader.read_u16::<BigEndian>()? as usize;

		Ok(Self { value, column })
	}
}

/// Leaves hold the class distribution of the training rows that reached them.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
	Leaf(Vec<f64>),
	Children {
		left: Box<Node>,
		right: Box<Node>,
		split: Split,
	},
}

impl Node {
	pub fn predict(&self, x: &[f64]) -> &[f64] {
		match self {
			Node::Leaf(distribution) => distribution,
			Node::Children { left, right, split } => {
				if x[split.column] <= split.value {
					left.predict(x)
				} else {
					right.predict(x)
				}
			}
		}
	}

	pub fn depth(&self) -> usize {
		match self {
			Node::Leaf(_) => 1,
			Node::Children { left, right, .. } => 1 + left.depth().max(right.depth()),
		}
	}

	pub fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
		match self {
			Node::Leaf(distribution) => {
				writer.write_u16::<BigEndian>(LEAF)?;
				writer.write_u16::<BigEndian>(distribution.len() as u16)?;
				for &p in distribution {
					writer.write_f64::<BigEndian>(p)?;
				}
			}
			Node::Children { left, right, split } => {
				writer.write_u16::<BigEndian>(CHILDREN)?;
				split.serialize(writer)?;
				left.serialize(writer)?;
				right.serialize(writer)?;
			}
		}

		Ok(())
	}

	pub fn deserialize<R: Read>(reader: &mut R) -> std::io::Result<Self> {
		match reader.read_u16::<BigEndian>()? {
			LEAF => {
				let len = reader.read_u16::<BigEndian>()?;
				let distribution = (0..len)
					.map(|_| reader.read_f64::<BigEndian>())
					.collect::<std::io::Result<Vec<f64>>>()?;

				Ok(Node::Leaf(distribution))
			}
			CHILDREN => {
				let split = Split::deserialize(reader)?;
				let left = Box::new(Node::deserialize(reader)?);
				let right = Box::new(Node::deserialize(reader)?);

				Ok(Node::Children { split, left, right })
			}
			i => Err(std::io::Error::new(
				std::io::ErrorKind::InvalidData,
				format!("unknown tree type {:?}", i),
			)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn stump() -> Node {
		Node::Children {
			left: Box::new(Node::Leaf(vec![1.0, 0.0])),
			right: Box::new(Node::Leaf(vec![0.25, 0.75])),
			split: Split { value: 2.5, column: 1 },
		}
	}

	#[test]
	fn predict_follows_split() {
		let node = stump();

		assert_eq!(node.predict(&[9.0, 1.0]), &[1.0, 0.0]);
		assert_eq!(node.predict(&[0.0, 2.5]), &[1.0, 0.0]);
		assert_eq!(node.predict(&[0.0, 3.0]), &[0.25, 0.75]);
		assert_eq!(node.depth(), 2);
	}

	#[test]
	fn serialization_works() -> std::io::Result<()> {
		let node = stump();
		let mut buffer = Vec::new();
		node.serialize(&mut buffer)?;

		assert_eq!(Node::deserialize(&mut buffer.as_slice())?, node);
		Ok(())
	}

	#[test]
	fn unknown_tag_is_invalid_data() {
		let bytes = [0u8, 7];
		let err = Node::deserialize(&mut &bytes[..]).unwrap_err();

		assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
	}
}
